use crate::llm::http;
use crate::llm::provider::AnalysisProvider;
use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "mixtral-8x7b";

const SYSTEM_MESSAGE: &str = "You are an expert software developer analyzing code errors. Provide detailed, actionable insights.";
const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u64 = 1024;

/// Groq provider over its OpenAI-compatible chat endpoint.
pub struct GroqProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl GroqProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let kind = ProviderKind::Groq;
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
            "messages": [
                { "role": "system", "content": SYSTEM_MESSAGE },
                { "role": "user", "content": prompt },
            ],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }
}

impl AnalysisProvider for GroqProvider {
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
        "groq"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}
