use crate::llm::http;
use crate::llm::provider::AnalysisProvider;
use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta2";
pub const DEFAULT_MODEL: &str = "models/text-bison-001";

/// Google PaLM text-generation provider. The API key travels as a query parameter.
pub struct PaLMProvider {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    model: String,
}

impl PaLMProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ConfigError> {
        let kind = ProviderKind::PaLM;
        http::validate_api_key(&kind, &settings.api_key)?;
        let base_url = http::resolve_base_url(&kind, &settings, DEFAULT_BASE_URL)?;
        let client = http::build_client(&kind)?;

        Ok(Self {
            client,
            base_url,
            model: Self::qualify_model(settings.model),
            api_key: settings.api_key,
        })
    }

    /// Model names are addressed as `models/<name>`.
    fn qualify_model(model: Option<String>) -> String {
        match model {
            Some(name) if name.starts_with("models/") => name,
            Some(name) => format!("models/{}", name),
            None => DEFAULT_MODEL.to_string(),
        }
    }

    fn extract_output(body: &Value) -> Result<String, AnalysisError> {
        let candidates = body
            .get("candidates")
            .and_then(Value::as_array)
            .filter(|candidates| !candidates.is_empty())
            .ok_or_else(|| AnalysisError::new("palm", "No response from PaLM"))?;

        let output = candidates[0]
            .get("output")
            .and_then(Value::as_str)
            .map(str::to_string);
        http::non_empty("palm", output)
    }
}

impl AnalysisProvider for PaLMProvider {
    fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        let body = json!({ "prompt": { "text": prompt } });

        Box::pin(async move {
            let backend = self.provider_name();
            let url = http::endpoint(
                backend,
                &self.base_url,
                &format!("{}:generateText", self.model),
            )?;
            let request = self
                .client
                .post(url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body);

            let response = http::send_json(backend, request).await?;
            Self::extract_output(&response)
        })
    }

    fn provider_name(&self) -> &str {
        "palm"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_qualification() {
        assert_eq!(PaLMProvider::qualify_model(None), DEFAULT_MODEL);
        assert_eq!(
            PaLMProvider::qualify_model(Some("chat-bison-001".to_string())),
            "models/chat-bison-001"
        );
        assert_eq!(
            PaLMProvider::qualify_model(Some("models/text-bison-001".to_string())),
            "models/text-bison-001"
        );
    }

    #[test]
    fn test_extract_output() {
        let body = json!({ "candidates": [{ "output": "Check the input" }] });
        assert_eq!(
            PaLMProvider::extract_output(&body).unwrap(),
            "Check the input"
        );

        let err = PaLMProvider::extract_output(&json!({ "candidates": [] })).unwrap_err();
        assert_eq!(err.message, "No response from PaLM");
    }
}
