//! Shared plumbing for the HTTP-backed providers.
//!
//! Every concrete backend is a single JSON POST. This module owns client
//! construction, credential and endpoint validation, and the mapping of
//! transport failures, HTTP statuses and unreadable bodies onto
//! [`AnalysisError`].

use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use reqwest::RequestBuilder;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Maximum number of response body characters kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Build the HTTP client used by one provider instance.
pub fn build_client(kind: &ProviderKind) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(concat!("error-lens/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::init_failed(kind, format!("HTTP client init failed: {}", e)))
}

/// Reject credentials that can never be valid in an HTTP header or query string.
pub fn validate_api_key(kind: &ProviderKind, api_key: &str) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::init_failed(kind, "API key is empty"));
    }

    if api_key
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || !c.is_ascii())
    {
        return Err(ConfigError::init_failed(
            kind,
            "API key contains whitespace or non-printable characters",
        ));
    }

    Ok(())
}

/// Resolve the endpoint base URL, preferring the override from settings.
pub fn resolve_base_url(
    kind: &ProviderKind,
    settings: &ProviderSettings,
    default_base: &str,
) -> Result<Url, ConfigError> {
    let raw = settings.base_url.as_deref().unwrap_or(default_base);
    let mut url = Url::parse(raw)
        .map_err(|e| ConfigError::init_failed(kind, format!("invalid base URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::init_failed(
            kind,
            format!("unsupported URL scheme '{}'", url.scheme()),
        ));
    }

    // Url::join drops the last segment unless the path ends in a slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Join a relative path onto a resolved base URL.
pub fn endpoint(backend: &str, base: &Url, path: &str) -> Result<Url, AnalysisError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| AnalysisError::new(backend, format!("invalid endpoint '{}': {}", path, e)))
}

/// Send a prepared request and decode a successful JSON body.
pub async fn send_json(backend: &str, request: RequestBuilder) -> Result<Value, AnalysisError> {
    let response = request
        .send()
        .await
        .map_err(|e| AnalysisError::new(backend, format!("request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AnalysisError::new(backend, format!("failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(AnalysisError::new(
            backend,
            format!("HTTP {}: {}", status, truncate(&body)),
        ));
    }

    debug!(backend, bytes = body.len(), "Received provider response");

    serde_json::from_str(&body)
        .map_err(|e| AnalysisError::new(backend, format!("malformed response: {}", e)))
}

/// Treat a missing or blank completion as a failure rather than a silent success.
pub fn non_empty(backend: &str, text: Option<String>) -> Result<String, AnalysisError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AnalysisError::new(backend, "response contained no analysis text")),
    }
}

/// Pull `choices[0].message.content` out of an OpenAI-compatible chat completion.
pub fn chat_completion_content(backend: &str, body: &Value) -> Result<String, AnalysisError> {
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string);
    non_empty(backend, content)
}

fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_key_validation() {
        let kind = ProviderKind::OpenAI;
        assert!(validate_api_key(&kind, "sk-test-123").is_ok());
        assert!(matches!(
            validate_api_key(&kind, "   "),
            Err(ConfigError::ProviderInitFailed { .. })
        ));
        assert!(validate_api_key(&kind, "sk test").is_err());
        assert!(validate_api_key(&kind, "sk-\n123").is_err());
    }

    #[test]
    fn test_base_url_resolution() {
        let kind = ProviderKind::Groq;
        let settings = ProviderSettings::new("key");
        let url = resolve_base_url(&kind, &settings, "https://api.groq.com/openai/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.groq.com/openai/v1/");

        let joined = endpoint("groq", &url, "chat/completions").unwrap();
        assert_eq!(
            joined.as_str(),
            "https://api.groq.com/openai/v1/chat/completions"
        );

        let bad = ProviderSettings::new("key").with_base_url(Some("not a url".to_string()));
        assert!(resolve_base_url(&kind, &bad, "https://example.com").is_err());

        let ftp = ProviderSettings::new("key").with_base_url(Some("ftp://example.com".to_string()));
        assert!(resolve_base_url(&kind, &ftp, "https://example.com").is_err());
    }

    #[test]
    fn test_chat_completion_content() {
        let body = json!({"choices": [{"message": {"content": "Root cause: x"}}]});
        assert_eq!(
            chat_completion_content("openai", &body).unwrap(),
            "Root cause: x"
        );

        let empty = json!({"choices": [{"message": {"content": ""}}]});
        assert!(chat_completion_content("openai", &empty).is_err());

        let missing = json!({"choices": []});
        assert!(chat_completion_content("openai", &missing).is_err());
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        let cut = truncate(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.len(), MAX_ERROR_BODY_CHARS + 3);
    }
}
