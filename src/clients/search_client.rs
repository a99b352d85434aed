//! 外部搜索客户端
//!
//! 多家搜索服务的适配器：tavily / serpapi / google_cse / brave。
//! 对外只承诺一件事：`search` 永远返回结果列表（最多 5 条），
//! 凭证缺失、网络失败、返回格式异常都降级为空列表并记录警告。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::{ProviderKind, SearchConfig};
use crate::error::SearchError;

/// 单次搜索最多保留的结果数
pub const MAX_RESULTS: usize = 5;

/// 搜索结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// 可插拔的搜索服务
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// 搜索关键词，最多返回 [`MAX_RESULTS`] 条，永不返回错误
    async fn search(&self, query: &str) -> Vec<SearchHit>;
}

/// 按配置创建搜索服务
pub fn build_provider(config: &SearchConfig) -> Arc<dyn SearchProvider> {
    let http = build_http_client(config.timeout_secs);
    match config.provider {
        ProviderKind::Tavily => Arc::new(TavilyProvider {
            http,
            api_key: config.tavily_api_key.clone(),
        }),
        ProviderKind::SerpApi => Arc::new(SerpApiProvider {
            http,
            api_key: config.serpapi_api_key.clone(),
        }),
        ProviderKind::GoogleCse => Arc::new(GoogleCseProvider {
            http,
            api_key: config.google_api_key.clone(),
            cx: config.google_cse_cx.clone(),
        }),
        ProviderKind::Brave => Arc::new(BraveProvider {
            http,
            api_key: config.brave_api_key.clone(),
        }),
    }
}

fn build_http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .user_agent("exam_question_gen/0.1")
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .unwrap_or_else(|e| {
            warn!("HTTP 客户端构建失败，使用默认配置: {}", e);
            Client::new()
        })
}

/// 把内部错误统一降级为空结果
fn degrade(provider: &'static str, result: Result<Vec<SearchHit>, SearchError>) -> Vec<SearchHit> {
    match result {
        Ok(mut hits) => {
            hits.truncate(MAX_RESULTS);
            debug!("[{}] 搜索返回 {} 条结果", provider, hits.len());
            hits
        }
        Err(e) => {
            warn!("[{}] 搜索失败，忽略补充资料: {}", provider, e);
            Vec::new()
        }
    }
}

fn require_key<'a>(
    provider: &'static str,
    key_name: &'static str,
    key: &'a Option<String>,
) -> Result<&'a str, SearchError> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(SearchError::MissingCredential {
            provider,
            key: key_name,
        })
}

async fn read_json(provider: &'static str, resp: reqwest::Response) -> Result<Value, SearchError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|val| {
                val.get("error")
                    .and_then(|e| e.get("message").or(Some(e)))
                    .and_then(|m| m.as_str().map(str::to_string))
                    .or_else(|| val.get("message").and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| body.chars().take(512).collect());
        return Err(SearchError::BadStatus {
            provider,
            status: status.as_u16(),
            message,
        });
    }
    resp.json::<Value>()
        .await
        .map_err(|source| SearchError::Request { provider, source })
}

/// 从结果数组中按字段名提取 (title, snippet, link)
fn collect_hits(items: Option<&Value>, title: &str, snippet: &str, link: &str) -> Vec<SearchHit> {
    let Some(arr) = items.and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    arr.iter()
        .filter_map(|it| {
            let field = |name: &str| {
                it.get(name)
                    .and_then(|x| x.as_str())
                    .unwrap_or("")
                    .trim()
                    .to_string()
            };
            let hit = SearchHit {
                title: field(title),
                snippet: field(snippet),
                link: field(link),
            };
            (!hit.title.is_empty() || !hit.snippet.is_empty()).then_some(hit)
        })
        .take(MAX_RESULTS)
        .collect()
}

// ========== Tavily ==========

pub struct TavilyProvider {
    http: Client,
    api_key: Option<String>,
}

impl TavilyProvider {
    async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let key = require_key(self.name(), "tavily_api_key", &self.api_key)?;
        let body = json!({
            "query": query,
            "search_depth": "basic",
            "max_results": MAX_RESULTS,
        });
        let resp = self
            .http
            .post("https://api.tavily.com/search")
            .header("Authorization", format!("Bearer {}", key))
            .json(&body)
            .send()
            .await
            .map_err(|source| SearchError::Request {
                provider: self.name(),
                source,
            })?;
        let raw = read_json(self.name(), resp).await?;
        Ok(parse_tavily(&raw))
    }
}

pub(crate) fn parse_tavily(raw: &Value) -> Vec<SearchHit> {
    collect_hits(raw.get("results"), "title", "content", "url")
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &'static str {
        "tavily"
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        degrade(self.name(), self.try_search(query).await)
    }
}

// ========== SerpAPI ==========

pub struct SerpApiProvider {
    http: Client,
    api_key: Option<String>,
}

impl SerpApiProvider {
    async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let key = require_key(self.name(), "serpapi_api_key", &self.api_key)?;
        let num = MAX_RESULTS.to_string();
        let resp = self
            .http
            .get("https://serpapi.com/search.json")
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", key),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|source| SearchError::Request {
                provider: self.name(),
                source,
            })?;
        let raw = read_json(self.name(), resp).await?;
        Ok(parse_serpapi(&raw))
    }
}

pub(crate) fn parse_serpapi(raw: &Value) -> Vec<SearchHit> {
    collect_hits(raw.get("organic_results"), "title", "snippet", "link")
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        degrade(self.name(), self.try_search(query).await)
    }
}

// ========== Google CSE ==========

pub struct GoogleCseProvider {
    http: Client,
    api_key: Option<String>,
    cx: Option<String>,
}

impl GoogleCseProvider {
    async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let key = require_key(self.name(), "google_api_key", &self.api_key)?;
        let cx = require_key(self.name(), "google_cse_cx", &self.cx)?;
        let num = MAX_RESULTS.to_string();
        let resp = self
            .http
            .get("https://www.googleapis.com/customsearch/v1")
            .query(&[("key", key), ("cx", cx), ("q", query), ("num", num.as_str())])
            .send()
            .await
            .map_err(|source| SearchError::Request {
                provider: self.name(),
                source,
            })?;
        let raw = read_json(self.name(), resp).await?;
        Ok(parse_google_cse(&raw))
    }
}

pub(crate) fn parse_google_cse(raw: &Value) -> Vec<SearchHit> {
    collect_hits(raw.get("items"), "title", "snippet", "link")
}

#[async_trait]
impl SearchProvider for GoogleCseProvider {
    fn name(&self) -> &'static str {
        "google_cse"
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        degrade(self.name(), self.try_search(query).await)
    }
}

// ========== Brave ==========

pub struct BraveProvider {
    http: Client,
    api_key: Option<String>,
}

impl BraveProvider {
    async fn try_search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let key = require_key(self.name(), "brave_api_key", &self.api_key)?;
        let count = MAX_RESULTS.to_string();
        let resp = self
            .http
            .get("https://api.search.brave.com/res/v1/web/search")
            .header("Accept", "application/json")
            .header("X-Subscription-Token", key)
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await
            .map_err(|source| SearchError::Request {
                provider: self.name(),
                source,
            })?;
        let raw = read_json(self.name(), resp).await?;
        Ok(parse_brave(&raw))
    }
}

pub(crate) fn parse_brave(raw: &Value) -> Vec<SearchHit> {
    collect_hits(
        raw.get("web").and_then(|w| w.get("results")),
        "title",
        "description",
        "url",
    )
}

#[async_trait]
impl SearchProvider for BraveProvider {
    fn name(&self) -> &'static str {
        "brave"
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        degrade(self.name(), self.try_search(query).await)
    }
}
