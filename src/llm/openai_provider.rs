use crate::llm::http;
use crate::llm::provider::AnalysisProvider;
use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI chat-completions provider.
pub struct OpenAIProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl OpenAIProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let kind = ProviderKind::OpenAI;
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
            "messages": [{ "role": "user", "content": prompt }],
        })
    }
}

impl AnalysisProvider for OpenAIProvider {
    fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        let body = self.build_body(prompt);

        Box::pin(async move {
            let backend = self.provider_name();
            let url = http::endpoint(backend, &self.base_url, "chat/completions")?;
            let request = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(&body);

            let response = http::send_json(backend, request).await?;
            http::chat_completion_content(backend, &response)
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let provider = OpenAIProvider::new(ProviderSettings::new("sk-test")).unwrap();
        assert_eq!(provider.model(), Some(DEFAULT_MODEL));

        let body = provider.build_body("why?".to_string());
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "why?");
    }

    #[test]
    fn test_rejects_blank_key() {
        let result = OpenAIProvider::new(ProviderSettings::new(""));
        assert!(matches!(result, Err(ConfigError::ProviderInitFailed { .. })));
    }
}
