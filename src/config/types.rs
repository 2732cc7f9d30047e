use crate::llm::{ProviderKind, ProviderSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The process-wide provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub collect_stack_trace: bool,
    pub mock_mode: bool,
    /// Endpoint override for the selected backend
    pub base_url: Option<String>,
    /// Optional deadline for one provider call; elapsed calls fall back to mock
    pub analysis_timeout: Option<Duration>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Mock,
            api_key: None,
            model: None,
            collect_stack_trace: true,
            mock_mode: false,
            base_url: None,
            analysis_timeout: None,
        }
    }
}

impl ProviderConfig {
    /// Usable API key, if one was supplied
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    /// Settings for the provider factory, or `None` without an API key.
    pub fn provider_settings(&self) -> Option<ProviderSettings> {
        self.api_key().map(|key| {
            ProviderSettings::new(key)
                .with_model(self.model.clone())
                .with_base_url(self.base_url.clone())
        })
    }

    /// A copy safe to print or log
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Field-wise override for [`ProviderConfig`]. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub provider: Option<ProviderKind>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub collect_stack_trace: Option<bool>,
    pub mock_mode: Option<bool>,
    pub base_url: Option<String>,
    pub analysis_timeout: Option<Duration>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: impl Into<ProviderKind>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_stack_trace(mut self, collect: bool) -> Self {
        self.collect_stack_trace = Some(collect);
        self
    }

    pub fn with_mock_mode(mut self, mock_mode: bool) -> Self {
        self.mock_mode = Some(mock_mode);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = Some(timeout);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether applying this patch can change which provider is active.
    pub fn affects_provider(&self) -> bool {
        self.provider.is_some()
            || self.api_key.is_some()
            || self.model.is_some()
            || self.mock_mode.is_some()
            || self.base_url.is_some()
    }

    /// Overlay this patch onto `base`.
    pub fn apply_to(&self, base: &ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone().unwrap_or_else(|| base.provider.clone()),
            api_key: self.api_key.clone().or_else(|| base.api_key.clone()),
            model: self.model.clone().or_else(|| base.model.clone()),
            collect_stack_trace: self.collect_stack_trace.unwrap_or(base.collect_stack_trace),
            mock_mode: self.mock_mode.unwrap_or(base.mock_mode),
            base_url: self.base_url.clone().or_else(|| base.base_url.clone()),
            analysis_timeout: self.analysis_timeout.or(base.analysis_timeout),
        }
    }

    /// Overlay `other` onto this patch; fields set in `other` win.
    pub fn merge(self, other: ConfigPatch) -> ConfigPatch {
        ConfigPatch {
            provider: other.provider.or(self.provider),
            api_key: other.api_key.or(self.api_key),
            model: other.model.or(self.model),
            collect_stack_trace: other.collect_stack_trace.or(self.collect_stack_trace),
            mock_mode: other.mock_mode.or(self.mock_mode),
            base_url: other.base_url.or(self.base_url),
            analysis_timeout: other.analysis_timeout.or(self.analysis_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_is_field_wise() {
        let base = ProviderConfig {
            provider: ProviderKind::OpenAI,
            api_key: Some("sk-1".to_string()),
            model: Some("gpt-4".to_string()),
            ..Default::default()
        };

        let merged = ConfigPatch::new().with_stack_trace(false).apply_to(&base);
        assert_eq!(merged.provider, ProviderKind::OpenAI);
        assert_eq!(merged.api_key.as_deref(), Some("sk-1"));
        assert_eq!(merged.model.as_deref(), Some("gpt-4"));
        assert!(!merged.collect_stack_trace);
    }

    #[test]
    fn test_patch_merge_prefers_later() {
        let file = ConfigPatch::new().with_provider("groq").with_model("a");
        let env = ConfigPatch::new().with_model("b").with_mock_mode(true);
        let merged = file.merge(env);

        assert_eq!(merged.provider, Some(ProviderKind::Groq));
        assert_eq!(merged.model.as_deref(), Some("b"));
        assert_eq!(merged.mock_mode, Some(true));
    }

    #[test]
    fn test_affects_provider() {
        assert!(!ConfigPatch::new().affects_provider());
        assert!(!ConfigPatch::new().with_stack_trace(true).affects_provider());
        assert!(ConfigPatch::new().with_mock_mode(true).affects_provider());
        assert!(ConfigPatch::new().is_empty());
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), None);
        assert!(config.provider_settings().is_none());
    }

    #[test]
    fn test_redacted_hides_key() {
        let config = ProviderConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let redacted = config.redacted();
        assert_eq!(redacted.api_key.as_deref(), Some("********"));
        assert_eq!(config.api_key.as_deref(), Some("sk-secret"));
    }
}
