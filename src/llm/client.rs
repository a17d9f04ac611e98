use super::types::*;
use crate::{Error, Result, config::ModelConfig};
use async_trait::async_trait;
use tracing::{debug, error};

#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Sends the instruction plus inline audio to the model and returns the
    /// text portion of its reply.
    async fn assess(
        &self,
        instruction: &str,
        audio_base64: &str,
        media_type: &str,
    ) -> Result<String>;
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_version: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, config: ModelConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            api_version: config.api_version,
            model: config.model,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl ReasoningClient for AnthropicClient {
    async fn assess(
        &self,
        instruction: &str,
        audio_base64: &str,
        media_type: &str,
    ) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message::user(instruction, audio_base64, media_type)],
        };

        debug!("Requesting assessment from model: {}", self.model);

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Reasoning service error ({}): {}", status, body);
            return Err(Error::model(
                "Failed to get feedback from reasoning service",
            ));
        }

        let body: MessagesResponse = response.json().await?;

        let text = body
            .content
            .first()
            .filter(|block| block.content_type == "text")
            .map(|block| block.text.clone())
            .unwrap_or_default();

        debug!("Received {} characters of model output", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> ModelConfig {
        ModelConfig {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: "test-api-key".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 2000,
            timeout_secs: 60,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new(reqwest::Client::new(), create_test_config());
        assert_eq!(client.model, "claude-3-5-sonnet-20241022");
        assert_eq!(client.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let mut config = create_test_config();
        config.base_url = "https://api.anthropic.com/".to_string();

        let client = AnthropicClient::new(reqwest::Client::new(), config);
        assert_eq!(client.base_url, "https://api.anthropic.com");
    }
}
