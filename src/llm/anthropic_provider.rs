//! Anthropic Messages API provider
//!
//! Sends the prompt as a single user message and concatenates the text
//! blocks of the reply.

use crate::llm::http;
use crate::llm::provider::AnalysisProvider;
use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-2";
pub const API_VERSION: &str = "2023-06-01";

const MAX_TOKENS: u64 = 1000;

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let kind = ProviderKind::Anthropic;
        http::validate_api_key(&kind, &settings.api_key)?;
        let base_url = http::resolve_base_url(&kind, &settings, DEFAULT_BASE_URL)?;
        let client = http::build_client(&kind)?;

        Ok(Self {
            client,
            base_url,
            model: settings.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: settings.api_key,
        })
    }

    fn build_body(&self, prompt: String) -> Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        })
    }

    /// Join the `text` of every text block in the response content.
    fn extract_text(body: &Value) -> Option<String> {
        let blocks = body.get("content")?.as_array()?;
        let text: String = blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect();
        Some(text)
    }
}

impl AnalysisProvider for AnthropicProvider {
    fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        let body = self.build_body(prompt);

        Box::pin(async move {
            let backend = self.provider_name();
            let url = http::endpoint(backend, &self.base_url, "v1/messages")?;
            let request = self
                .client
                .post(url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", API_VERSION)
                .json(&body);

            let response = http::send_json(backend, request).await?;
            http::non_empty(backend, Self::extract_text(&response))
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let body = json!({
            "content": [
                { "type": "text", "text": "Root cause: " },
                { "type": "tool_use", "id": "x" },
                { "type": "text", "text": "null input" },
            ]
        });
        assert_eq!(
            AnthropicProvider::extract_text(&body).as_deref(),
            Some("Root cause: null input")
        );
        assert_eq!(AnthropicProvider::extract_text(&json!({})), None);
    }
}
