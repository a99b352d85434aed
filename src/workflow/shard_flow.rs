//! 分片出题流程 - 流程层
//!
//! 核心职责：定义"一个分片"的完整处理流程
//!
//! 流程顺序：
//! 1. 构建提示词（题量、题型、难度、答案格式、补充资料）
//! 2. 经重试执行器调用模型，要求结构化输出
//! 3. 解析 JSON → 答案归一化 → 分配 ID

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::clients::{BackendRequest, GenerativeBackend};
use crate::error::GenerationError;
use crate::infrastructure::{ProgressReporter, RetryExecutor};
use crate::models::{DocumentPart, Question, QuestionType, RawQuestion};
use crate::services::answer_normalizer::normalize_question;
use crate::services::prompt_builder::{question_schema, shard_prompt, GENERATION_SYSTEM};
use crate::workflow::shard_ctx::ShardCtx;

/// 一次运行中所有分片共享的只读输入
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub parts: Vec<DocumentPart>,
    pub allowed_types: Vec<QuestionType>,
    pub difficulty: String,
    /// 补充资料，没有时为空字符串
    pub enrichment: String,
}

/// 分片出题流程
///
/// - 只负责一个分片：一次模型调用（含重试）得到一组题目
/// - 不关心分片之间如何调度
/// - 可以廉价克隆，方便放进并发任务
#[derive(Clone)]
pub struct ShardGenerator {
    backend: Arc<dyn GenerativeBackend>,
    retry: RetryExecutor,
}

#[derive(Deserialize)]
struct QuestionEnvelope {
    questions: Vec<RawQuestion>,
}

impl ShardGenerator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, retry: RetryExecutor) -> Self {
        Self { backend, retry }
    }

    pub async fn generate(
        &self,
        input: &GenerationContext,
        ctx: ShardCtx,
        progress: &ProgressReporter,
    ) -> Result<Vec<Question>> {
        info!("{} 📝 请求 {} 道题 (模型: {})", ctx, ctx.count, self.backend.name());

        let prompt = shard_prompt(
            ctx.count,
            &input.allowed_types,
            &input.difficulty,
            &input.enrichment,
        );
        let schema = question_schema(&input.allowed_types);
        let label = ctx.to_string();

        let response = self
            .retry
            .execute(&label, Some(progress), || {
                self.backend.generate(
                    BackendRequest::json(&prompt, &input.parts, schema.clone())
                        .with_system(GENERATION_SYSTEM),
                )
            })
            .await
            .map_err(|exhausted| {
                warn!("{} ❌ 已尝试 {} 次，放弃", ctx, exhausted.attempts);
                exhausted.into_source()
            })?;

        let text = response
            .non_empty_text()
            .ok_or(GenerationError::EmptyResponse {
                shard: ctx.index,
                total: ctx.total,
            })?;
        debug!("{} 响应长度: {} 字符", ctx, text.len());

        let raw_questions = parse_raw_questions(text)
            .map_err(|source| GenerationError::MalformedResponse {
                shard: ctx.index,
                source,
            })?;

        let stamp = chrono::Utc::now().timestamp_millis();
        let mut questions: Vec<Question> = raw_questions
            .into_iter()
            .enumerate()
            .map(|(pos, raw)| normalize_question(raw, format!("{}-{}-{}", stamp, ctx.index, pos)))
            .collect();

        if questions.len() > ctx.count {
            warn!(
                "{} ⚠️ 模型返回 {} 道题，超出要求的 {} 道，已截断",
                ctx,
                questions.len(),
                ctx.count
            );
            questions.truncate(ctx.count);
        }

        info!("{} ✓ 得到 {} 道题", ctx, questions.len());
        Ok(questions)
    }
}

/// 解析模型输出的题目列表
///
/// 接受 `{"questions": [...]}` 或裸数组，容忍 Markdown 代码块和前后的说明文字。
pub fn parse_raw_questions(
    text: &str,
) -> std::result::Result<Vec<RawQuestion>, serde_json::Error> {
    let value: JsonValue = serde_json::from_str(extract_json(text))?;
    match value {
        JsonValue::Array(_) => serde_json::from_value(value),
        other => serde_json::from_value::<QuestionEnvelope>(other).map(|env| env.questions),
    }
}

fn extract_json(text: &str) -> &str {
    let body = strip_code_fence(text.trim());
    let start = body.find(['{', '[']);
    let end = body.rfind(['}', ']']);
    match (start, end) {
        (Some(s), Some(e)) if s < e => &body[s..=e],
        _ => body,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // 跳过语言标记所在的第一行
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().trim_end_matches("```").trim()
}
