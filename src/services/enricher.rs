//! 补充资料检索 - 业务能力层
//!
//! 资料里的题目常常只有"略"、"未提供"、"见教材"之类的占位答案。
//! 出题前先让模型找出这些缺失答案对应的搜索关键词，再联网检索，
//! 把结果作为补充资料拼进每个分片的提示词。
//!
//! 整个过程尽力而为：任何一步失败都只记录警告并返回空字符串，不影响出题。

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::clients::{BackendRequest, GenerativeBackend, SearchHit, SearchProvider};
use crate::config::SearchMode;
use crate::error::RetryExhausted;
use crate::infrastructure::{ProgressReporter, RetryExecutor};
use crate::models::{DocumentPart, QuestionType};
use crate::services::prompt_builder::{
    keyword_extraction_prompt, native_search_prompt, NONE_SENTINEL,
};

/// 模型有时会在关键词前加标签
static KEYWORD_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:关键词|关键字|keywords?)\s*[:：]\s*").expect("valid regex")
});

/// 超过这个长度的输出才检查是否是"资料已完整"之类的说明文字
const PROSE_MIN_CHARS: usize = 40;

/// 模型用自然语言说明无需补充时常见的词
const COMPLETENESS_MARKERS: [&str; 4] = ["完整", "提供", "没有缺失", "无需"];

/// 补充资料检索器
pub struct ContextEnricher {
    backend: Arc<dyn GenerativeBackend>,
    provider: Option<Arc<dyn SearchProvider>>,
    mode: SearchMode,
    retry: RetryExecutor,
}

impl ContextEnricher {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        mode: SearchMode,
        retry: RetryExecutor,
    ) -> Self {
        Self {
            backend,
            provider: None,
            mode,
            retry,
        }
    }

    /// 设置外部搜索服务（`SearchMode::Provider` 时使用）
    pub fn with_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// 生成补充资料块，没有可用资料时返回空字符串
    pub async fn enrich(
        &self,
        parts: &[DocumentPart],
        allowed: &[QuestionType],
        progress: &ProgressReporter,
    ) -> String {
        if parts.is_empty() {
            debug!("没有资料，跳过补充资料检索");
            return String::new();
        }
        if self.mode == SearchMode::Disabled {
            debug!("联网检索已关闭，跳过补充资料检索");
            return String::new();
        }

        match self.try_enrich(parts, allowed, progress).await {
            Ok(context) => context,
            Err(e) => {
                warn!("⚠️ 补充资料检索失败，继续直接出题: {:#}", e);
                progress.log("⚠️ 补充资料检索失败，继续直接出题");
                String::new()
            }
        }
    }

    async fn try_enrich(
        &self,
        parts: &[DocumentPart],
        allowed: &[QuestionType],
        progress: &ProgressReporter,
    ) -> Result<String> {
        progress.report("🔍 正在分析资料中缺失的答案...", 10);

        let prompt = keyword_extraction_prompt(allowed);
        let response = self
            .retry
            .execute("关键词提取", Some(progress), || {
                self.backend.generate(BackendRequest::text(&prompt, parts))
            })
            .await
            .map_err(RetryExhausted::into_source)?;

        let Some(keywords) = usable_keywords(response.non_empty_text().unwrap_or_default()) else {
            progress.report("✓ 资料中没有需要补充的答案", 35);
            return Ok(String::new());
        };

        progress.report(&format!("🌐 正在检索补充资料: {}", keywords), 20);

        let body = match self.mode {
            SearchMode::Native => self.native_search(&keywords, progress).await?,
            SearchMode::Provider => self.provider_search(&keywords).await,
            SearchMode::Disabled => String::new(),
        };

        if body.trim().is_empty() {
            progress.report("未检索到可用的补充资料", 35);
            return Ok(String::new());
        }

        info!("✓ 补充资料 {} 字符", body.chars().count());
        progress.report("✓ 补充资料检索完成", 35);
        Ok(wrap_context(&body))
    }

    /// 模型自带联网搜索：一次调用，原样采用模型整理的文本
    async fn native_search(&self, keywords: &str, progress: &ProgressReporter) -> Result<String> {
        let prompt = native_search_prompt(keywords);
        let response = self
            .retry
            .execute("联网搜索", Some(progress), || {
                self.backend
                    .generate(BackendRequest::text(&prompt, &[]).with_grounded_search())
            })
            .await
            .map_err(RetryExhausted::into_source)?;

        let Some(text) = response.non_empty_text() else {
            return Ok(String::new());
        };

        let mut body = text.to_string();
        if !response.sources.is_empty() {
            let titles = response
                .sources
                .iter()
                .map(|s| s.title.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            body.push_str(&format!("\n[来源]: {}", titles));
        }
        Ok(body)
    }

    async fn provider_search(&self, keywords: &str) -> String {
        let Some(provider) = &self.provider else {
            warn!("⚠️ 已选择外部搜索，但没有配置搜索服务");
            return String::new();
        };
        let hits = provider.search(keywords).await;
        debug!("[{}] 检索到 {} 条结果", provider.name(), hits.len());
        format_hits(&hits)
    }
}

/// 解析关键词提取的输出，返回 `None` 表示无事可做
pub fn usable_keywords(raw: &str) -> Option<String> {
    let keywords = KEYWORD_LABEL.replace(raw.trim(), "").trim().to_string();

    if keywords.is_empty() || keywords.eq_ignore_ascii_case(NONE_SENTINEL) {
        return None;
    }

    if keywords.chars().count() > PROSE_MIN_CHARS
        && COMPLETENESS_MARKERS.iter().any(|m| keywords.contains(m))
    {
        debug!("关键词输出像是说明文字，忽略: {}", keywords);
        return None;
    }

    Some(keywords)
}

/// 把搜索结果排成编号的参考资料
fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut block = format!("[{}] {}\n{}", i + 1, hit.title, hit.snippet);
            if !hit.link.is_empty() {
                block.push_str(&format!("\n链接: {}", hit.link));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn wrap_context(body: &str) -> String {
    format!(
        "=== 补充资料（联网检索） ===\n\
         以下资料用于补全原题中标注为\"略\"、\"无答案\"等缺失的答案，\
         填写这类答案时请优先依据这些资料。\n\
         {}\n\
         === 补充资料结束 ===",
        body.trim()
    )
}
