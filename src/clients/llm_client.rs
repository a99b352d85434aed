//! OpenAI 兼容的模型后端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::backend::{BackendRequest, BackendResponse, GenerativeBackend, OutputShape};
use crate::config::Config;
use crate::models::DocumentPart;

/// OpenAI 兼容后端
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model_name: String,
    search_model_name: Option<String>,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            search_model_name: config.llm_search_model_name.clone(),
            temperature: config.llm_temperature,
        }
    }

    /// 联网搜索时切换到专用模型（若已配置）
    fn model_for(&self, grounded_search: bool) -> &str {
        if grounded_search {
            if let Some(search_model) = self.search_model_name.as_deref() {
                return search_model;
            }
            warn!(
                "未配置联网搜索模型，使用 {} 直接回答检索请求",
                self.model_name
            );
        }
        &self.model_name
    }

    /// 构建用户消息：先放资料，最后放指令
    fn build_user_parts(
        prompt: &str,
        parts: &[DocumentPart],
    ) -> Vec<ChatCompletionRequestUserMessageContentPart> {
        let mut content_parts = Vec::with_capacity(parts.len() + 1);

        for part in parts {
            match part {
                DocumentPart::Text { name, content } => {
                    content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
                        ChatCompletionRequestMessageContentPartText {
                            text: format!("【资料：{}】\n{}", name, content),
                        },
                    ));
                }
                DocumentPart::Image { .. } => {
                    if let Some(url) = part.data_url() {
                        debug!("🖼️ 附加图片资料: {}", part.name());
                        content_parts.push(ChatCompletionRequestUserMessageContentPart::ImageUrl(
                            ChatCompletionRequestMessageContentPartImage {
                                image_url: ImageUrl {
                                    url,
                                    detail: Some(ImageDetail::Auto),
                                },
                            },
                        ));
                    }
                }
                DocumentPart::Binary {
                    name, mime_type, ..
                } => {
                    warn!(
                        "当前后端无法直接读取 {} ({})，已跳过，请先转换为文本或图片",
                        name, mime_type
                    );
                }
            }
        }

        content_parts.push(ChatCompletionRequestUserMessageContentPart::Text(
            ChatCompletionRequestMessageContentPartText {
                text: prompt.to_string(),
            },
        ));

        content_parts
    }
}

/// 合并调用方的系统消息与输出格式约束
fn build_system_message(system: Option<&str>, output: &OutputShape) -> Option<String> {
    match output {
        OutputShape::Text => system.map(str::to_string),
        OutputShape::Json(schema) => {
            let schema_text = serde_json::to_string_pretty(schema).unwrap_or_default();
            let constraint = format!(
                "你必须只输出一个 JSON 对象，不要输出任何解释或 Markdown。\
                 JSON 必须严格符合以下 JSON Schema：\n{}",
                schema_text
            );
            Some(match system {
                Some(sys) => format!("{}\n\n{}", sys, constraint),
                None => constraint,
            })
        }
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, request: BackendRequest<'_>) -> Result<BackendResponse> {
        let model = self.model_for(request.grounded_search);
        debug!("调用 LLM API，模型: {}", model);
        debug!(
            "提示词长度: {} 字符，资料 {} 份",
            request.prompt.len(),
            request.parts.len()
        );

        let mut messages = Vec::new();

        if let Some(sys_msg) = build_system_message(request.system, &request.output) {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = if request.parts.is_empty() {
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt)
                .build()?
        } else {
            ChatCompletionRequestUserMessageArgs::default()
                .content(ChatCompletionRequestUserMessageContent::Array(
                    Self::build_user_parts(request.prompt, request.parts),
                ))
                .build()?
        };
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(self.temperature)
            .build()?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty());

        Ok(BackendResponse {
            text,
            sources: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_output_keeps_system_message() {
        assert_eq!(
            build_system_message(Some("你是出题助手"), &OutputShape::Text),
            Some("你是出题助手".to_string())
        );
        assert_eq!(build_system_message(None, &OutputShape::Text), None);
    }

    #[test]
    fn test_json_output_embeds_schema() {
        let schema = json!({"type": "object", "required": ["questions"]});
        let system = build_system_message(Some("你是出题助手"), &OutputShape::Json(schema)).unwrap();
        assert!(system.starts_with("你是出题助手"));
        assert!(system.contains("\"required\""));
        assert!(system.contains("JSON Schema"));
    }

    #[test]
    fn test_binary_parts_are_skipped() {
        let parts = vec![
            DocumentPart::Text {
                name: "a.txt".to_string(),
                content: "正文".to_string(),
            },
            DocumentPart::Binary {
                name: "b.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                data_base64: "JVBERg==".to_string(),
            },
        ];
        let built = OpenAiBackend::build_user_parts("出题", &parts);
        // 资料文本 + 指令，PDF 被跳过
        assert_eq!(built.len(), 2);
    }

    #[test]
    fn test_search_model_used_for_grounded_requests() {
        let config = Config {
            llm_search_model_name: Some("gpt-4o-search-preview".to_string()),
            ..Config::default()
        };
        let backend = OpenAiBackend::new(&config);
        assert_eq!(backend.model_for(true), "gpt-4o-search-preview");
        assert_eq!(backend.model_for(false), config.llm_model_name);
    }
}
