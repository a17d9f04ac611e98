use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// User message carrying the instruction text plus the inline audio
    /// payload.
    pub fn user(instruction: &str, audio_base64: &str, media_type: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![
                ContentBlock::Text {
                    text: instruction.to_string(),
                },
                ContentBlock::Image {
                    source: MediaSource {
                        source_type: "base64".to_string(),
                        media_type: media_type.to_string(),
                        data: audio_base64.to_string(),
                    },
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Image { source: MediaSource },
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}
