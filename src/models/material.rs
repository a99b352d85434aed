use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// 用户上传的资料
///
/// 创建后不可变，由调用方持有。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub size: usize,
}

impl Material {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        let size = data.len();
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            data,
            size,
        }
    }

    /// 纯文本资料的便捷构造
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name, "text/plain", text.into().into_bytes())
    }

    fn is_textual(&self) -> bool {
        let mime = self.mime_type.to_ascii_lowercase();
        mime.starts_with("text/")
            || matches!(
                mime.as_str(),
                "application/json" | "application/xml" | "application/x-yaml"
            )
    }

    /// 转换为发送给模型的文档片段
    pub fn to_part(&self) -> DocumentPart {
        if self.is_textual() {
            return DocumentPart::Text {
                name: self.name.clone(),
                content: String::from_utf8_lossy(&self.data).into_owned(),
            };
        }

        let data_base64 = BASE64.encode(&self.data);
        if self.mime_type.to_ascii_lowercase().starts_with("image/") {
            DocumentPart::Image {
                name: self.name.clone(),
                mime_type: self.mime_type.clone(),
                data_base64,
            }
        } else {
            DocumentPart::Binary {
                name: self.name.clone(),
                mime_type: self.mime_type.clone(),
                data_base64,
            }
        }
    }
}

/// 发送给模型的文档片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPart {
    Text {
        name: String,
        content: String,
    },
    Image {
        name: String,
        mime_type: String,
        data_base64: String,
    },
    Binary {
        name: String,
        mime_type: String,
        data_base64: String,
    },
}

impl DocumentPart {
    pub fn name(&self) -> &str {
        match self {
            DocumentPart::Text { name, .. }
            | DocumentPart::Image { name, .. }
            | DocumentPart::Binary { name, .. } => name,
        }
    }

    /// `data:` URL 形式，文本片段返回 `None`
    pub fn data_url(&self) -> Option<String> {
        match self {
            DocumentPart::Text { .. } => None,
            DocumentPart::Image {
                mime_type,
                data_base64,
                ..
            }
            | DocumentPart::Binary {
                mime_type,
                data_base64,
                ..
            } => Some(format!("data:{};base64,{}", mime_type, data_base64)),
        }
    }
}
