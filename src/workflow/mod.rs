pub mod shard_ctx;
pub mod shard_flow;

pub use shard_ctx::ShardCtx;
pub use shard_flow::{parse_raw_questions, GenerationContext, ShardGenerator};
