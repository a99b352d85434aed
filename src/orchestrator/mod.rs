//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分片规划和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_planner` - 分片规划
//! - 把题目总数切成若干分片
//!
//! ### `shard_scheduler` - 分片调度
//! - 串行：逐个执行，分片之间等待间隔
//! - 并行：错峰启动，统一等待
//! - 上报分片进度
//!
//! ### `exam_generator` - 出题总流程
//! - 补充资料 → 分片 → 清洗 → 去重 → 打乱
//!
//! ## 层次关系
//!
//! ```text
//! exam_generator (处理一次出题请求)
//!     ↓
//! shard_scheduler (处理 Vec<ShardCtx>)
//!     ↓
//! workflow::ShardGenerator (处理单个分片)
//!     ↓
//! services (能力层：prompt / normalize / clean / dedup / enrich)
//!     ↓
//! infrastructure + clients (重试、进度、模型、搜索)
//! ```

pub mod batch_planner;
pub mod exam_generator;
pub mod shard_scheduler;

// 重新导出主要类型
pub use batch_planner::{plan_shards, ShardPlan};
pub use exam_generator::ExamGenerator;
pub use shard_scheduler::ShardScheduler;
