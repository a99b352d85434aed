//! 错误类型
//!
//! 叶子层使用带类型的错误（`thiserror`），编排层统一使用 `anyhow::Result`，
//! 需要区分时可以通过 `downcast_ref` 取回这里定义的类型。

use std::fmt;

use thiserror::Error;

/// 配置错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 分片大小必须至少为 1
    #[error("分片大小必须大于 0")]
    ZeroShardSize,
    /// 没有选择任何题型
    #[error("至少需要选择一种题型")]
    NoQuestionTypes,
    /// 环境变量或配置项解析失败
    #[error("配置项 {key} 解析失败: 值 '{value}' 无法转换为 {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    /// 读取配置文件失败
    #[error("无法读取配置文件 {path}: {reason}")]
    FileUnreadable { path: String, reason: String },
}

/// 外部搜索错误
///
/// 只在搜索客户端内部流转，对外统一降级为空结果
#[derive(Debug, Error)]
pub enum SearchError {
    /// 缺少 API 密钥
    #[error("{provider} 缺少凭证: {key}")]
    MissingCredential {
        provider: &'static str,
        key: &'static str,
    },
    /// 网络请求失败
    #[error("{provider} 请求失败: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// 服务端返回错误状态
    #[error("{provider} 返回 HTTP {status}: {message}")]
    BadStatus {
        provider: &'static str,
        status: u16,
        message: String,
    },
}

/// 出题流程中的致命错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 模型没有返回任何文本
    #[error("模型返回空响应 (分片 {shard}/{total})")]
    EmptyResponse { shard: usize, total: usize },
    /// 整个分片的结构化输出无法解析
    #[error("分片 {shard} 的结构化输出无法解析: {source}")]
    MalformedResponse {
        shard: usize,
        #[source]
        source: serde_json::Error,
    },
    /// 并发分片任务异常终止（panic 或被取消）
    #[error("分片 {shard} 任务异常终止: {reason}")]
    ShardAborted { shard: usize, reason: String },
}

/// 重试耗尽
///
/// 与被包装操作自身的错误区分开：调用方可以知道"放弃前尝试了几次"，
/// 也可以通过 [`RetryExhausted::into_source`] 原样取回最后一次的错误。
pub struct RetryExhausted<E> {
    pub label: String,
    pub attempts: u32,
    pub source: E,
}

impl<E> RetryExhausted<E> {
    /// 取回最后一次失败的原始错误
    pub fn into_source(self) -> E {
        self.source
    }
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 在 {} 次尝试后仍然失败: {}",
            self.label, self.attempts, self.source
        )
    }
}

impl<E: fmt::Debug> fmt::Debug for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExhausted")
            .field("label", &self.label)
            .field("attempts", &self.attempts)
            .field("source", &self.source)
            .finish()
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryExhausted<E> {}

/// 应用程序结果类型
pub type Result<T> = anyhow::Result<T>;
