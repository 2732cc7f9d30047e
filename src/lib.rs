//! # error-lens
//!
//! Intercepts failures from arbitrary units of work, asks a pluggable LLM
//! backend for a root-cause analysis, and broadcasts the resulting report to
//! live subscribers. Interception is observational: the caller always gets
//! the original error back.
//!
//! ## Architecture Overview
//!
//! - **[`llm`]**: the [`AnalysisProvider`] contract, the mock provider, the
//!   HTTP clients and the name-to-constructor [`ProviderRegistry`]
//! - **[`config`]**: the process-wide [`ConfigStore`] holding the active provider
//! - **[`analysis`]**: context capture, prompt rendering and the [`Analyzer`]
//!   with its fallback to mock
//! - **[`intercept`]**: the [`Interceptor`] combinator wrapping fallible work
//! - **[`broadcast`]**: best-effort multicast of reports to subscribers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use error_lens::{CallSite, ConfigPatch, Interceptor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Falls back to mock mode when no API key is configured
//!     error_lens::configure(ConfigPatch::new().with_provider("groq"))?;
//!
//!     let interceptor = Interceptor::global();
//!     let parse = interceptor.wrap(CallSite::new("Config", "parse"), |raw: String| async move {
//!         raw.parse::<u32>()
//!     });
//!
//!     if let Err(e) = parse.call("forty-two".to_string()).await {
//!         eprintln!("parse failed: {}", e);
//!     }
//!     Ok(())
//! }
//! ```

/// Failure capture, prompt rendering and analysis with fallback.
pub mod analysis;

/// Report fan-out to live subscriber connections.
pub mod broadcast;

/// Process-wide provider configuration.
pub mod config;

/// Wrapping of fallible work so failures are analyzed and published.
pub mod intercept;

/// Provider-agnostic analysis backends.
///
/// Mock, OpenAI, Groq, Anthropic, HuggingFace and PaLM clients behind a
/// single trait, plus the registry that builds them by name.
pub mod llm;

/// Environment constants and path utilities
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use analysis::{
    AnalysisPipelineError, AnalysisReport, Analyzer, CallSite, ContextBuilder, ErrorFacts,
    InvocationContext, SourceHint, SourceLocation,
};
pub use broadcast::{
    BroadcastSummary, Broadcaster, ChannelSubscriber, ConnectionState, Subscriber, SubscriberId,
};
pub use config::{ConfigPatch, ConfigSnapshot, ConfigStore, ProviderConfig};
pub use intercept::{InterceptError, InterceptOptions, Intercepted, Interceptor};
pub use llm::{
    AnalysisError, AnalysisProvider, ConfigError, MockProvider, ProviderKind, ProviderRegistry,
};

/// Merge `patch` into the process-wide configuration.
///
/// Even when this returns an error the global store has switched to the mock
/// provider and remains usable.
pub fn configure(patch: ConfigPatch) -> Result<std::sync::Arc<ConfigSnapshot>, ConfigError> {
    ConfigStore::global().configure(patch)
}

/// Restore the process-wide configuration to its defaults (mock provider).
pub fn reset() {
    ConfigStore::global().reset()
}
