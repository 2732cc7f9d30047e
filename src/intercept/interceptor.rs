//! Observational wrapping of fallible async work.
//!
//! A wrapped call behaves exactly like the bare call on success. On failure
//! the error is described to the analysis pipeline, the resulting report is
//! broadcast and handed to the per-call callback, and then the original error
//! is returned as [`InterceptError::Work`].

use crate::analysis::{
    AnalysisPipelineError, AnalysisReport, Analyzer, CallSite, ContextBuilder,
};
use crate::broadcast::Broadcaster;
use crate::config::ConfigStore;
use crate::intercept::types::{InterceptError, InterceptOptions};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct Interceptor {
    analyzer: Analyzer,
    broadcaster: Arc<Broadcaster>,
}

impl Interceptor {
    pub fn new(store: Arc<ConfigStore>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            analyzer: Analyzer::new(store),
            broadcaster,
        }
    }

    /// Uses the process-wide configuration store and broadcaster
    pub fn global() -> Self {
        Self::new(ConfigStore::global(), Broadcaster::global())
    }

    pub fn with_analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        self.analyzer.store()
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Wrap `work` so every call through the returned handle is intercepted.
    pub fn wrap<F>(&self, call_site: CallSite, work: F) -> Intercepted<F> {
        Intercepted {
            interceptor: self.clone(),
            call_site,
            options: InterceptOptions::default(),
            work,
        }
    }

    /// Await `work` once and observe its failure.
    ///
    /// `arguments` are the call's inputs as they should appear in the report.
    pub async fn run<T, E, Fut>(
        &self,
        call_site: &CallSite,
        arguments: Vec<Value>,
        options: &InterceptOptions,
        work: Fut,
    ) -> Result<T, InterceptError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        match work.await {
            Ok(value) => Ok(value),
            Err(e) => match self.observe(call_site, arguments, options, &e).await {
                Ok(_) => Err(InterceptError::Work(e)),
                Err(pipeline) => {
                    error!(
                        method = %call_site,
                        "Analysis pipeline failed, replacing original error ({}): {}",
                        e, pipeline
                    );
                    Err(InterceptError::Pipeline(pipeline))
                }
            },
        }
    }

    /// Analyze a failure and publish the report. Returns the report that was
    /// published.
    pub async fn observe<E>(
        &self,
        call_site: &CallSite,
        arguments: Vec<Value>,
        options: &InterceptOptions,
        failure: &E,
    ) -> Result<AnalysisReport, AnalysisPipelineError>
    where
        E: Error + ?Sized + 'static,
    {
        // One snapshot per call; overrides never touch the stored config
        let snapshot = self.store().resolve(&options.overrides);
        let builder = ContextBuilder::new(snapshot.config.collect_stack_trace);

        let facts = builder.error_facts(failure);
        let context = builder.invocation(call_site, arguments, &options.source);
        info!(
            method = %call_site,
            error_type = %facts.error_type,
            "Intercepted failure: {}",
            facts.message
        );

        let report = self
            .analyzer
            .analyze_with(&snapshot, facts, context)
            .await?;

        let summary = self.broadcaster.broadcast(&report);
        debug!(
            dispatched = summary.dispatched,
            skipped = summary.skipped,
            "Report published"
        );

        if let Some(callback) = &options.on_report {
            callback(report.clone());
        }
        Ok(report)
    }
}

/// A unit of work bound to an [`Interceptor`] and a call site
#[derive(Debug, Clone)]
pub struct Intercepted<F> {
    interceptor: Interceptor,
    call_site: CallSite,
    options: InterceptOptions,
    work: F,
}

impl<F> Intercepted<F> {
    pub fn with_options(mut self, options: InterceptOptions) -> Self {
        self.options = options;
        self
    }

    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    /// Invoke the wrapped work with `args`.
    ///
    /// Arguments are captured for the report before the work consumes them:
    /// a tuple or sequence becomes one entry per element, `()` becomes none.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, InterceptError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        A: Serialize,
        E: Error + 'static,
    {
        let arguments = capture_arguments(&args);
        self.interceptor
            .run(&self.call_site, arguments, &self.options, (self.work)(args))
            .await
    }
}

fn capture_arguments<A: Serialize + ?Sized>(args: &A) -> Vec<Value> {
    match serde_json::to_value(args) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Null) => Vec::new(),
        Ok(other) => vec![other],
        Err(e) => vec![Value::String(format!("<unserializable: {}>", e))],
    }
}
