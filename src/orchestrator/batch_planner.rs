//! 分片规划 - 编排层
//!
//! 把题目总数切成若干个不超过分片大小的分片。

use crate::workflow::ShardCtx;

/// 分片计划
///
/// 各分片题量之和等于总数，每片在 `[1, shard_size]` 之间。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardPlan {
    sizes: Vec<usize>,
}

impl ShardPlan {
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// 题目总数
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }

    /// 按顺序生成每个分片的上下文（序号从1开始）
    pub fn contexts(&self) -> impl Iterator<Item = ShardCtx> + '_ {
        let total = self.sizes.len();
        self.sizes
            .iter()
            .enumerate()
            .map(move |(i, &count)| ShardCtx::new(i + 1, total, count))
    }
}

/// 贪心切分：每次取 `min(剩余, shard_size)`
///
/// `shard_size` 为 0 时按 1 处理，配置校验会在更早的地方拒绝这种输入。
pub fn plan_shards(count: usize, shard_size: usize) -> ShardPlan {
    let shard_size = shard_size.max(1);
    let mut sizes = Vec::with_capacity(count.div_ceil(shard_size));
    let mut remaining = count;
    while remaining > 0 {
        let size = remaining.min(shard_size);
        sizes.push(size);
        remaining -= size;
    }
    ShardPlan { sizes }
}
