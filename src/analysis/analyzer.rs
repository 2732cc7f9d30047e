use crate::analysis::prompt;
use crate::analysis::types::{
    AnalysisPipelineError, AnalysisReport, ErrorFacts, InvocationContext,
};
use crate::config::{ConfigSnapshot, ConfigStore};
use crate::llm::{AnalysisError, AnalysisProvider, MockProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Constructs the provider used after the active one fails
pub type FallbackFactory = Arc<dyn Fn() -> Arc<dyn AnalysisProvider> + Send + Sync>;

/// Renders the prompt, calls the active provider and falls back to a fresh
/// mock on any provider failure.
///
/// The configured provider gets exactly one attempt. The fallback is never
/// taken from the shared store, so an outage of the configured backend cannot
/// affect it.
#[derive(Clone)]
pub struct Analyzer {
    store: Arc<ConfigStore>,
    fallback: FallbackFactory,
}

impl Analyzer {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            fallback: Arc::new(|| Arc::new(MockProvider::new())),
        }
    }

    /// An analyzer over [`ConfigStore::global`]
    pub fn global() -> Self {
        Self::new(ConfigStore::global())
    }

    /// Replace the fallback constructor.
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn() -> Arc<dyn AnalysisProvider> + Send + Sync + 'static,
    {
        self.fallback = Arc::new(fallback);
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Analyze with the provider active at call start.
    pub async fn analyze(
        &self,
        facts: ErrorFacts,
        context: InvocationContext,
    ) -> Result<AnalysisReport, AnalysisPipelineError> {
        let snapshot = self.store.snapshot();
        self.analyze_with(&snapshot, facts, context).await
    }

    /// Analyze with the provider and settings of an explicit snapshot.
    pub async fn analyze_with(
        &self,
        snapshot: &ConfigSnapshot,
        facts: ErrorFacts,
        context: InvocationContext,
    ) -> Result<AnalysisReport, AnalysisPipelineError> {
        let prompt = prompt::render(&facts, &context);
        let provider = Arc::clone(&snapshot.provider);

        debug!(
            provider = provider.provider_name(),
            method = %context.qualified_method(),
            "Requesting error analysis"
        );

        let analysis =
            match call_provider(provider.as_ref(), prompt.clone(), snapshot.config.analysis_timeout)
                .await
            {
                Ok(text) => text,
                Err(primary) => {
                    warn!(
                        backend = %primary.backend,
                        "Analysis provider failed, falling back to mock: {}",
                        primary.message
                    );
                    let fallback = (self.fallback)();
                    match call_provider(fallback.as_ref(), prompt, None).await {
                        Ok(text) => text,
                        Err(fallback_error) => {
                            error!(
                                "Fallback analysis failed after provider error ({}): {}",
                                primary, fallback_error
                            );
                            return Err(AnalysisPipelineError {
                                primary: Some(primary),
                                fallback: fallback_error,
                            });
                        }
                    }
                }
            };

        Ok(AnalysisReport::new(facts, analysis, &context))
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// One provider attempt. Timeouts and blank answers count as failures.
async fn call_provider(
    provider: &dyn AnalysisProvider,
    prompt: String,
    timeout: Option<Duration>,
) -> Result<String, AnalysisError> {
    let backend = provider.provider_name();
    let call = provider.analyze(prompt);

    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AnalysisError::new(backend, format!("timed out after {:?}", limit)))?,
        None => call.await,
    };

    match result {
        Ok(text) if text.trim().is_empty() => {
            Err(AnalysisError::new(backend, "provider returned an empty analysis"))
        }
        other => other,
    }
}
