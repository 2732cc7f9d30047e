use crate::analysis::{AnalysisPipelineError, AnalysisReport, SourceHint};
use crate::config::ConfigPatch;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Receives a copy of each report produced for one wrapped call
pub type ReportCallback = Arc<dyn Fn(AnalysisReport) + Send + Sync>;

/// Per-call settings for an intercepted unit of work
#[derive(Clone, Default)]
pub struct InterceptOptions {
    /// Merged over the stored configuration for this call only
    pub overrides: ConfigPatch,
    pub on_report: Option<ReportCallback>,
    pub source: SourceHint,
}

impl InterceptOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: ConfigPatch) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn on_report<F>(mut self, callback: F) -> Self
    where
        F: Fn(AnalysisReport) + Send + Sync + 'static,
    {
        self.on_report = Some(Arc::new(callback));
        self
    }

    pub fn with_source(mut self, source: SourceHint) -> Self {
        self.source = source;
        self
    }
}

impl fmt::Debug for InterceptOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptOptions")
            .field("overrides", &self.overrides)
            .field("on_report", &self.on_report.is_some())
            .field("source", &self.source)
            .finish()
    }
}

/// Outcome of a failed intercepted call.
///
/// `Work` carries the wrapped unit's own error, untouched. `Pipeline` is only
/// returned when the fallback analysis failed too; in that case the original
/// error has been logged and dropped.
#[derive(Debug)]
pub enum InterceptError<E> {
    Work(E),
    Pipeline(AnalysisPipelineError),
}

impl<E> InterceptError<E> {
    pub fn is_pipeline(&self) -> bool {
        matches!(self, InterceptError::Pipeline(_))
    }

    pub fn work_error(&self) -> Option<&E> {
        match self {
            InterceptError::Work(e) => Some(e),
            InterceptError::Pipeline(_) => None,
        }
    }

    pub fn into_work_error(self) -> Option<E> {
        match self {
            InterceptError::Work(e) => Some(e),
            InterceptError::Pipeline(_) => None,
        }
    }
}

impl<E> From<AnalysisPipelineError> for InterceptError<E> {
    fn from(e: AnalysisPipelineError) -> Self {
        InterceptError::Pipeline(e)
    }
}

impl<E: fmt::Display> fmt::Display for InterceptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptError::Work(e) => e.fmt(f),
            InterceptError::Pipeline(e) => e.fmt(f),
        }
    }
}

impl<E: Error + 'static> Error for InterceptError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InterceptError::Work(e) => e.source(),
            InterceptError::Pipeline(e) => e.source(),
        }
    }
}
