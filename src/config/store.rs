//! Process-wide configuration store.
//!
//! The active configuration and provider are published together as an
//! immutable [`ConfigSnapshot`] behind an `RwLock<Arc<_>>`. Readers clone the
//! `Arc` once per operation, so a concurrent [`ConfigStore::configure`] can
//! never hand one analysis a half-updated view. Every path through
//! `configure` leaves a provider installed; failures fall back to mock before
//! the error is returned.

use crate::config::types::{ConfigPatch, ProviderConfig};
use crate::llm::{
    AnalysisProvider, ConfigError, MockProvider, ProviderKind, ProviderRegistry, ProviderSettings,
};
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};
use tracing::{info, warn};

static GLOBAL_STORE: LazyLock<Arc<ConfigStore>> = LazyLock::new(|| Arc::new(ConfigStore::new()));

/// Configuration plus the provider instantiated from it
#[derive(Clone)]
pub struct ConfigSnapshot {
    pub config: ProviderConfig,
    pub provider: Arc<dyn AnalysisProvider>,
    /// True when `provider` is the mock, whether forced or as a fallback
    pub mock_active: bool,
}

impl ConfigSnapshot {
    fn mock(config: ProviderConfig) -> Self {
        Self {
            config,
            provider: Arc::new(MockProvider::new()),
            mock_active: true,
        }
    }
}

impl fmt::Debug for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigSnapshot")
            .field("config", &self.config.redacted())
            .field("provider", &self.provider.provider_name())
            .field("mock_active", &self.mock_active)
            .finish()
    }
}

pub struct ConfigStore {
    registry: RwLock<ProviderRegistry>,
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl ConfigStore {
    /// A store in its default state (mock provider) with the built-in registry
    pub fn new() -> Self {
        Self::with_registry(ProviderRegistry::default())
    }

    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
            current: RwLock::new(Arc::new(ConfigSnapshot::mock(ProviderConfig::default()))),
        }
    }

    /// The store shared by the whole process
    pub fn global() -> Arc<ConfigStore> {
        Arc::clone(&GLOBAL_STORE)
    }

    /// Current configuration and provider, read once.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        let current = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&current)
    }

    /// Merge `patch` over the current configuration and install the resulting
    /// provider.
    ///
    /// On [`ConfigError`] the store has already switched to the mock provider
    /// with the merged configuration, so callers may ignore the error and keep
    /// running in degraded mode.
    pub fn configure(&self, patch: ConfigPatch) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());

        let config = patch.apply_to(&current.config);
        let (snapshot, error) = match instantiate(&registry, &config) {
            Ok(snapshot) => (snapshot, None),
            Err(e) => {
                warn!("Provider configuration failed, falling back to mock mode: {}", e);
                (ConfigSnapshot::mock(config), Some(e))
            }
        };

        let snapshot = Arc::new(snapshot);
        *current = Arc::clone(&snapshot);

        match error {
            Some(e) => Err(e),
            None => Ok(snapshot),
        }
    }

    /// Restore the default configuration and the mock provider.
    pub fn reset(&self) {
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::new(ConfigSnapshot::mock(ProviderConfig::default()));
        info!("Configuration reset to defaults");
    }

    /// Build a one-off snapshot with per-call overrides, without touching the
    /// stored configuration.
    ///
    /// The shared provider is reused unless the overrides can change it. A
    /// failing override resolves to mock rather than an error.
    pub fn resolve(&self, overrides: &ConfigPatch) -> Arc<ConfigSnapshot> {
        let base = self.snapshot();
        if overrides.is_empty() {
            return base;
        }

        let config = overrides.apply_to(&base.config);
        if !overrides.affects_provider() {
            return Arc::new(ConfigSnapshot {
                config,
                provider: Arc::clone(&base.provider),
                mock_active: base.mock_active,
            });
        }

        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        match instantiate(&registry, &config) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                warn!("Per-call provider override failed, using mock: {}", e);
                Arc::new(ConfigSnapshot::mock(config))
            }
        }
    }

    /// Register an additional provider constructor.
    ///
    /// Factories run inside [`ConfigStore::configure`] while the store is
    /// write-locked, so a factory must not call back into this store
    /// (`snapshot`, `configure`, `resolve`, ...). Everything it needs arrives
    /// in the [`ProviderSettings`] argument.
    pub fn register_provider<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(ProviderSettings) -> Result<Arc<dyn AnalysisProvider>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
        registry.register(name, factory);
    }

    pub fn provider_names(&self) -> Vec<String> {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry.names()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &self.snapshot())
            .finish()
    }
}

/// Resolve the provider a configuration asks for.
fn instantiate(
    registry: &ProviderRegistry,
    config: &ProviderConfig,
) -> Result<ConfigSnapshot, ConfigError> {
    if config.mock_mode {
        info!("Running in mock mode");
        return Ok(ConfigSnapshot::mock(config.clone()));
    }

    let Some(settings) = config.provider_settings() else {
        warn!("No API key provided. Using mock mode.");
        return Ok(ConfigSnapshot::mock(config.clone()));
    };

    let provider = registry.create(&config.provider, settings)?;
    let mock_active = config.provider == ProviderKind::Mock;
    if mock_active {
        info!("Running in mock mode");
    } else {
        info!(
            provider = provider.provider_name(),
            model = provider.model().unwrap_or("default"),
            "Analysis provider configured"
        );
    }

    Ok(ConfigSnapshot {
        config: config.clone(),
        provider,
        mock_active,
    })
}
