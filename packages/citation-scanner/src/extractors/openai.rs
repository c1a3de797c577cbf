//! OpenAI implementation of the ClaimExtractor trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use citation_scanner::extractors::OpenAIExtractor;
//!
//! let extractor = OpenAIExtractor::new("sk-...").with_model("gpt-4o");
//! let parser = DocumentParser::new(fetcher, extractor);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ScannerConfig, SecretString, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::error::{ExtractionError, ExtractionResult};
use crate::pipeline::prompts::format_claims_prompt;
use crate::traits::extractor::ClaimExtractor;
use crate::types::config::ExtractionConfig;

/// Claim extractor backed by the OpenAI chat-completions API.
#[derive(Clone)]
pub struct OpenAIExtractor {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAIExtractor {
    /// Create a new extractor with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    /// Create from a loaded [`ScannerConfig`].
    pub fn from_config(config: &ScannerConfig) -> ExtractionResult<Self> {
        let api_key = config
            .require_api_key()
            .map_err(|e| ExtractionError::Config(e.to_string()))?;

        Ok(Self::new(api_key.clone())
            .with_model(&config.openai_model)
            .with_base_url(&config.openai_base_url))
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, content: &str, config: &ExtractionConfig) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: config.system_role.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format_claims_prompt(content),
                },
            ],
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }
}

#[async_trait]
impl ClaimExtractor for OpenAIExtractor {
    async fn extract(&self, content: &str, config: &ExtractionConfig) -> ExtractionResult<String> {
        let request = self.build_request(content, config);

        debug!(model = %self.model, content_length = content.len(), "Requesting claim extraction");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Service(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Service(
                format!("OpenAI API error ({}): {}", status, error_text).into(),
            ));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Service(Box::new(e)))?;

        first_choice(chat_response)
    }
}

fn first_choice(response: ChatResponse) -> ExtractionResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ExtractionError::EmptyResponse)
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_builder() {
        let extractor = OpenAIExtractor::new("sk-test")
            .with_model("gpt-4o-mini")
            .with_base_url("https://custom.api.com/");

        assert_eq!(extractor.model(), "gpt-4o-mini");
        assert_eq!(extractor.base_url, "https://custom.api.com");
        assert_eq!(extractor.api_key.expose(), "sk-test");
    }

    #[test]
    fn test_request_carries_config() {
        let extractor = OpenAIExtractor::new("sk-test");
        let config = ExtractionConfig::default();

        let body = serde_json::to_value(extractor.build_request("page text", &config)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], config.system_role.as_str());
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .ends_with("page text"));
        assert_eq!(body["max_tokens"], 16_300);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"claims\": []}"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(response).unwrap(), r#"{"claims": []}"#);

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_choice(empty), Err(ExtractionError::EmptyResponse)));

        let null: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(first_choice(null), Err(ExtractionError::EmptyResponse)));
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = ScannerConfig::default();
        let err = OpenAIExtractor::from_config(&config).err().unwrap();
        assert!(matches!(err, ExtractionError::Config(_)));
    }
}
