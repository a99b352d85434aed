//! 生成式模型后端接口
//!
//! 流程层只依赖这里的 trait，具体用哪家模型由调用方注入。

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::models::DocumentPart;

/// 期望的输出形状
#[derive(Debug, Clone, PartialEq)]
pub enum OutputShape {
    /// 自由文本
    Text,
    /// 符合给定 JSON Schema 的对象
    Json(JsonValue),
}

/// 一次模型调用
#[derive(Debug, Clone)]
pub struct BackendRequest<'a> {
    pub prompt: &'a str,
    pub system: Option<&'a str>,
    pub parts: &'a [DocumentPart],
    pub output: OutputShape,
    /// 是否启用模型自带的联网搜索
    pub grounded_search: bool,
}

impl<'a> BackendRequest<'a> {
    pub fn text(prompt: &'a str, parts: &'a [DocumentPart]) -> Self {
        Self {
            prompt,
            system: None,
            parts,
            output: OutputShape::Text,
            grounded_search: false,
        }
    }

    pub fn json(prompt: &'a str, parts: &'a [DocumentPart], schema: JsonValue) -> Self {
        Self {
            prompt,
            system: None,
            parts,
            output: OutputShape::Json(schema),
            grounded_search: false,
        }
    }

    pub fn with_system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_grounded_search(mut self) -> Self {
        self.grounded_search = true;
        self
    }
}

/// 联网搜索引用的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingSource {
    pub title: String,
    pub uri: Option<String>,
}

/// 模型响应
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendResponse {
    /// 模型输出文本，没有任何输出时为 `None`
    pub text: Option<String>,
    /// 联网搜索时引用的来源
    pub sources: Vec<GroundingSource>,
}

impl BackendResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sources: Vec::new(),
        }
    }

    /// 去掉首尾空白后的非空文本
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// 生成式模型后端
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// 后端名称（仅用于日志）
    fn name(&self) -> &str;

    async fn generate(&self, request: BackendRequest<'_>) -> Result<BackendResponse>;
}
