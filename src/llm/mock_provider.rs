//! Deterministic, I/O-free provider.
//!
//! Used whenever mock mode is forced, no API key is configured, or a real
//! backend fails and the analyzer needs a guaranteed answer.

use crate::llm::provider::AnalysisProvider;
use crate::llm::types::AnalysisError;
use futures::future::BoxFuture;

/// Prefix of every analysis produced by [`MockProvider`]
pub const MOCK_ANALYSIS_PREFIX: &str = "Mock Analysis:";

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    /// The text returned for `prompt`.
    pub fn render(prompt: &str) -> String {
        format!(
            "{} This is a simulated response for the prompt \"{}\"",
            MOCK_ANALYSIS_PREFIX, prompt
        )
    }
}

impl AnalysisProvider for MockProvider {
    fn analyze(&self, prompt: String) -> BoxFuture<'_, Result<String, AnalysisError>> {
        Box::pin(async move { Ok(Self::render(&prompt)) })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
