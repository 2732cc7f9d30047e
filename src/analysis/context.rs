//! Builds [`ErrorFacts`] and [`InvocationContext`] from a failing invocation.
//!
//! Source extraction is best-effort: anything that cannot be read leaves the
//! snippet empty instead of failing the capture.

use crate::analysis::types::{
    CallSite, ErrorFacts, InvocationContext, SourceHint, SourceLocation,
};
use regex::Regex;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;
use std::sync::LazyLock;
use tracing::debug;

/// Lines shown on each side of a [`SourceLocation`]
pub const DEFAULT_SNIPPET_RADIUS: usize = 5;

static DYN_ERROR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9_]+::)*(?:Box|Arc|Rc)<dyn (?:[A-Za-z0-9_]+::)*Error\b")
        .expect("static regex")
});

#[derive(Debug, Clone)]
pub struct ContextBuilder {
    collect_stack_trace: bool,
    snippet_radius: usize,
}

impl ContextBuilder {
    pub fn new(collect_stack_trace: bool) -> Self {
        Self {
            collect_stack_trace,
            snippet_radius: DEFAULT_SNIPPET_RADIUS,
        }
    }

    pub fn with_snippet_radius(mut self, radius: usize) -> Self {
        self.snippet_radius = radius;
        self
    }

    pub fn collects_stack_trace(&self) -> bool {
        self.collect_stack_trace
    }

    /// Capture type, message and (when enabled) the causal chain plus a
    /// backtrace of the interception point.
    pub fn error_facts<E>(&self, error: &E) -> ErrorFacts
    where
        E: Error + ?Sized + 'static,
    {
        let error_type = short_type_name(std::any::type_name::<E>());
        let message = error.to_string();
        let stack = if self.collect_stack_trace {
            render_stack(&error_type, error)
        } else {
            String::new()
        };

        ErrorFacts {
            error_type,
            message,
            stack,
        }
    }

    pub fn invocation(
        &self,
        call_site: &CallSite,
        arguments: Vec<serde_json::Value>,
        source: &SourceHint,
    ) -> InvocationContext {
        let source_snippet = match source {
            SourceHint::None => None,
            SourceHint::Text(text) if text.trim().is_empty() => None,
            SourceHint::Text(text) => Some(text.clone()),
            SourceHint::Location(location) => self.read_snippet(location),
        };

        InvocationContext {
            owner_name: call_site.owner.clone(),
            method_name: call_site.method.clone(),
            arguments,
            source_snippet,
        }
    }

    /// Read the lines around `location`, numbered, or `None` if unavailable.
    pub fn read_snippet(&self, location: &SourceLocation) -> Option<String> {
        let content = match std::fs::read_to_string(&location.file) {
            Ok(content) => content,
            Err(e) => {
                debug!("Source snippet unavailable for {:?}: {}", location.file, e);
                return None;
            }
        };

        let lines: Vec<&str> = content.lines().collect();
        let target = location.line as usize;
        if target == 0 || target > lines.len() {
            debug!(
                "Line {} out of range for {:?} ({} lines)",
                location.line,
                location.file,
                lines.len()
            );
            return None;
        }

        let first = target.saturating_sub(self.snippet_radius).max(1);
        let last = target.saturating_add(self.snippet_radius).min(lines.len());
        let width = last.to_string().len();

        let mut snippet = String::new();
        for number in first..=last {
            let marker = if number == target { '>' } else { ' ' };
            let _ = writeln!(
                snippet,
                "{}{:>width$} | {}",
                marker,
                number,
                lines[number - 1],
                width = width
            );
        }
        Some(snippet.trim_end().to_string())
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Reduce a fully qualified type name to its last path segment, without generics.
///
/// Boxed trait objects (`Box<dyn Error>`) carry no concrete name and become `Error`.
pub fn short_type_name(full: &str) -> String {
    if DYN_ERROR_PATTERN.is_match(full) {
        return "Error".to_string();
    }

    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn render_stack<E>(error_type: &str, error: &E) -> String
where
    E: Error + ?Sized,
{
    let mut stack = format!("{}: {}", error_type, error);

    let mut source = error.source();
    if source.is_some() {
        stack.push_str("\n\nCaused by:");
    }
    let mut depth = 0;
    while let Some(cause) = source {
        let _ = write!(stack, "\n    {}: {}", depth, cause);
        depth += 1;
        source = cause.source();
    }

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(stack, "\n\nBacktrace:\n{}", backtrace);
    }

    stack
}
