//! # Exam Question Gen
//!
//! 从学习资料批量生成考试题目的 Rust 库
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 与业务无关的通用能力
//! - `RetryExecutor` - 指数退避重试
//! - `ProgressReporter` - 单调进度上报，可在并发分片间共享
//!
//! ### ② 客户端（Clients）
//! - `clients/` - 外部服务的调用契约与实现
//! - `GenerativeBackend` / `OpenAiBackend` - 生成式模型
//! - `SearchProvider` - tavily / serpapi / google_cse / brave
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `answer_normalizer` - 按题型校正答案形状
//! - `text_cleaner` - 去掉题号前缀
//! - `deduplicator` - 指纹去重
//! - `enricher` - 联网检索补充资料
//! - `prompt_builder` - 提示词
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 定义"一个分片"的完整处理流程
//! - `ShardCtx` - 上下文封装（分片序号 + 题量）
//! - `ShardGenerator` - 流程编排（prompt → LLM → parse → normalize）
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/batch_planner` - 分片规划
//! - `orchestrator/shard_scheduler` - 串行 / 错峰并行调度
//! - `orchestrator/exam_generator` - 出题入口
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{GenerativeBackend, OpenAiBackend, SearchProvider};
pub use config::{Config, SchedulingMode, SearchMode};
pub use error::{ConfigError, GenerationError, Result, RetryExhausted};
pub use infrastructure::{ProgressReporter, RetryExecutor};
pub use models::{Answer, ExamGenerationRequest, Material, Question, QuestionType};
pub use orchestrator::ExamGenerator;
pub use workflow::{ShardCtx, ShardGenerator};
