use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported analysis backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Mock,
    OpenAI,
    HuggingFace,
    PaLM,
    Anthropic,
    Groq,
    /// A backend registered at runtime under its own name
    #[serde(untagged)]
    Custom(String),
}

impl ProviderKind {
    /// All built-in variants, in registry order.
    pub const BUILT_IN: [ProviderKind; 6] = [
        ProviderKind::Mock,
        ProviderKind::OpenAI,
        ProviderKind::HuggingFace,
        ProviderKind::PaLM,
        ProviderKind::Anthropic,
        ProviderKind::Groq,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::OpenAI => "openai",
            ProviderKind::HuggingFace => "huggingface",
            ProviderKind::PaLM => "palm",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Groq => "groq",
            ProviderKind::Custom(name) => name,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_lowercase().as_str() {
            "mock" => ProviderKind::Mock,
            "openai" => ProviderKind::OpenAI,
            "huggingface" => ProviderKind::HuggingFace,
            "palm" => ProviderKind::PaLM,
            "anthropic" => ProviderKind::Anthropic,
            "groq" => ProviderKind::Groq,
            _ => ProviderKind::Custom(trimmed.to_string()),
        })
    }
}

impl From<&str> for ProviderKind {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

/// Settings handed to a provider factory
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: Option<String>,
    /// Overrides the backend's public endpoint (tests, proxies, self-hosted gateways)
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Failure of a single provider call
#[derive(Debug, Clone, thiserror::Error)]
#[error("{backend} analysis failed: {message}")]
pub struct AnalysisError {
    pub backend: String,
    pub message: String,
}

impl AnalysisError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Configuration failures. The store always lands in mock mode before
/// one of these is returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown provider: {name}")]
    UnknownProvider { name: String },
    #[error("Failed to initialize provider '{provider}': {message}")]
    ProviderInitFailed { provider: String, message: String },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn init_failed(provider: &ProviderKind, message: impl Into<String>) -> Self {
        ConfigError::ProviderInitFailed {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from("OpenAI"), ProviderKind::OpenAI);
        assert_eq!(ProviderKind::from(" groq "), ProviderKind::Groq);
        assert_eq!(
            ProviderKind::from("doesNotExist"),
            ProviderKind::Custom("doesNotExist".to_string())
        );
        assert_eq!(ProviderKind::PaLM.to_string(), "palm");
    }

    #[test]
    fn test_provider_kind_serde() {
        let json = serde_json::to_string(&ProviderKind::HuggingFace).unwrap();
        assert_eq!(json, "\"huggingface\"");

        let parsed: ProviderKind = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(parsed, ProviderKind::Anthropic);

        let custom: ProviderKind = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(custom, ProviderKind::Custom("local".to_string()));
    }

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::new("groq", "HTTP 401");
        assert_eq!(err.to_string(), "groq analysis failed: HTTP 401");

        let err = ConfigError::UnknownProvider {
            name: "doesNotExist".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown provider: doesNotExist");
    }
}
