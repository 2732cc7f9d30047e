use crate::llm::types::{AnalysisError, ConfigError, ProviderKind, ProviderSettings};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Capability shared by every analysis backend
pub trait AnalysisProvider: Send + Sync {
    /// Turn a rendered prompt into an analysis.
    ///
    /// Implementations must fail with [`AnalysisError`] on network,
    /// authentication or malformed-response conditions and never report an
    /// empty string as success.
    fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>>;

    /// Get provider name/identifier
    fn provider_name(&self) -> &str;

    /// Model used for requests, if the backend has one
    fn model(&self) -> Option<&str> {
        None
    }
}

/// Constructor registered under a provider name
pub type ProviderFactory =
    Arc<dyn Fn(ProviderSettings) -> Result<Arc<dyn AnalysisProvider>, ConfigError> + Send + Sync>;

/// Maps provider names to their constructors.
///
/// Lookups are case-insensitive. [`ProviderRegistry::default`] is pre-populated
/// with every built-in backend.
#[derive(Clone)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    /// A registry with no entries
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for kind in ProviderKind::BUILT_IN {
            registry.register_builtin(kind);
        }
        registry
    }

    fn register_builtin(&mut self, kind: ProviderKind) {
        use crate::llm::{
            AnthropicProvider, GroqProvider, HuggingFaceProvider, MockProvider, OpenAIProvider,
            PaLMProvider,
        };

        let factory = match kind {
            ProviderKind::Mock => factory_for(|_settings| Ok(MockProvider::new())),
            ProviderKind::OpenAI => factory_for(OpenAIProvider::new),
            ProviderKind::HuggingFace => factory_for(HuggingFaceProvider::new),
            ProviderKind::PaLM => factory_for(PaLMProvider::new),
            ProviderKind::Anthropic => factory_for(AnthropicProvider::new),
            ProviderKind::Groq => factory_for(GroqProvider::new),
            ProviderKind::Custom(_) => return,
        };

        self.factories.insert(kind.as_str().to_string(), factory);
    }

    /// Register (or replace) a constructor under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderSettings) -> Result<Arc<dyn AnalysisProvider>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.factories
            .insert(name.into().to_lowercase(), Arc::new(factory));
    }

    pub fn contains(&self, kind: &ProviderKind) -> bool {
        self.factories.contains_key(&kind.as_str().to_lowercase())
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Instantiate the provider registered for `kind`.
    pub fn create(
        &self,
        kind: &ProviderKind,
        settings: ProviderSettings,
    ) -> Result<Arc<dyn AnalysisProvider>, ConfigError> {
        let factory = self
            .factories
            .get(&kind.as_str().to_lowercase())
            .ok_or_else(|| ConfigError::UnknownProvider {
                name: kind.to_string(),
            })?;
        factory(settings)
    }
}

fn factory_for<P, F>(build: F) -> ProviderFactory
where
    P: AnalysisProvider + 'static,
    F: Fn(ProviderSettings) -> Result<P, ConfigError> + Send + Sync + 'static,
{
    Arc::new(
        move |settings: ProviderSettings| -> Result<Arc<dyn AnalysisProvider>, ConfigError> {
            Ok(Arc::new(build(settings)?))
        },
    )
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    struct EchoProvider;

    impl AnalysisProvider for EchoProvider {
        fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
            Box::pin(async move { Ok(format!("echo: {}", prompt)) })
        }

        fn provider_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_builtin_registry_names() {
        let registry = ProviderRegistry::default();
        assert_eq!(
            registry.names(),
            vec!["anthropic", "groq", "huggingface", "mock", "openai", "palm"]
        );
        assert!(registry.contains(&ProviderKind::PaLM));
        assert!(!registry.contains(&ProviderKind::Custom("echo".to_string())));
    }

    #[test]
    fn test_unknown_provider_lookup() {
        let registry = ProviderRegistry::default();
        let result = registry.create(
            &ProviderKind::from("doesNotExist"),
            ProviderSettings::new("x"),
        );
        match result {
            Err(ConfigError::UnknownProvider { name }) => assert_eq!(name, "doesNotExist"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("unknown provider should not resolve"),
        }
    }

    #[tokio::test]
    async fn test_custom_registration() {
        let mut registry = ProviderRegistry::empty();
        registry.register("Echo", |_settings| Ok(Arc::new(EchoProvider)));

        let provider = registry
            .create(&ProviderKind::from("echo"), ProviderSettings::new("x"))
            .unwrap();
        assert_eq!(provider.provider_name(), "echo");
        assert_eq!(provider.analyze("hi".to_string()).await.unwrap(), "echo: hi");
    }

    #[tokio::test]
    async fn test_mock_factory_ignores_settings() {
        let registry = ProviderRegistry::default();
        let provider = registry
            .create(&ProviderKind::Mock, ProviderSettings::default())
            .unwrap();
        let analysis = provider.analyze("prompt".to_string()).await.unwrap();
        assert_eq!(analysis, MockProvider::render("prompt"));
    }
}
