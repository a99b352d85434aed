//! 分片上下文
//!
//! 封装"我正在生成第几个分片、要几道题"这一信息

use std::fmt::Display;

/// 分片上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardCtx {
    /// 分片序号（从1开始）
    pub index: usize,

    /// 分片总数
    pub total: usize,

    /// 本分片要求的题目数量
    pub count: usize,
}

impl ShardCtx {
    pub fn new(index: usize, total: usize, count: usize) -> Self {
        Self {
            index,
            total,
            count,
        }
    }
}

impl Display for ShardCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[分片 {}/{}]", self.index, self.total)
    }
}
