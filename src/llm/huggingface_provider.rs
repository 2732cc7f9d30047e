//! Hugging Face Inference API provider
//!
//! Uses the text-generation task. If the configured model fails for any
//! reason the request is repeated once against [`FALLBACK_MODEL`] before the
//! failure is reported.

use crate::llm::http;
use crate::llm::provider::AnalysisProvider;
use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tracing::warn;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "facebook/opt-1.3b";
pub const FALLBACK_MODEL: &str = "bigscience/bloom-560m";

const MAX_NEW_TOKENS: u64 = 250;
const TEMPERATURE: f64 = 0.7;
const TOP_P: f64 = 0.95;

pub struct HuggingFaceProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl HuggingFaceProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let kind = ProviderKind::HuggingFace;
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

    fn build_body(prompt: &str, with_top_p: bool) -> Value {
        let mut parameters = json!({
            "max_new_tokens": MAX_NEW_TOKENS,
            "temperature": TEMPERATURE,
            "return_full_text": false,
        });
        if with_top_p {
            parameters["top_p"] = json!(TOP_P);
        }

        json!({ "inputs": prompt, "parameters": parameters })
    }

    /// The API answers with either `[{generated_text}]` or `{generated_text}`.
    fn extract_text(body: &Value) -> Option<String> {
        let entry = match body {
            Value::Array(items) => items.first()?,
            other => other,
        };
        entry
            .get("generated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    async fn generate(&self, model: &str, body: &Value) -> Result<String, AnalysisError> {
        let backend = self.provider_name();
        let url = http::endpoint(backend, &self.base_url, &format!("models/{}", model))?;
        let request = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body);

        let response = http::send_json(backend, request).await?;
        http::non_empty(backend, Self::extract_text(&response))
    }
}

impl AnalysisProvider for HuggingFaceProvider {
    fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        Box::pin(async move {
            let primary = Self::build_body(&prompt, true);
            match self.generate(&self.model, &primary).await {
                Ok(text) => Ok(text),
                Err(e) => {
                    warn!(
                        "HuggingFace model '{}' failed ({}), falling back to {}",
                        self.model, e.message, FALLBACK_MODEL
                    );
                    let fallback = Self::build_body(&prompt, false);
                    self.generate(FALLBACK_MODEL, &fallback).await
                }
            }
        })
    }

    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_shapes() {
        let list = json!([{ "generated_text": "from list" }]);
        assert_eq!(
            HuggingFaceProvider::extract_text(&list).as_deref(),
            Some("from list")
        );

        let object = json!({ "generated_text": "from object" });
        assert_eq!(
            HuggingFaceProvider::extract_text(&object).as_deref(),
            Some("from object")
        );

        assert_eq!(HuggingFaceProvider::extract_text(&json!([])), None);
    }

    #[test]
    fn test_fallback_body_omits_top_p() {
        let primary = HuggingFaceProvider::build_body("p", true);
        let fallback = HuggingFaceProvider::build_body("p", false);
        assert_eq!(primary["parameters"]["top_p"], json!(TOP_P));
        assert!(fallback["parameters"].get("top_p").is_none());
        assert_eq!(fallback["parameters"]["return_full_text"], json!(false));
    }
}
