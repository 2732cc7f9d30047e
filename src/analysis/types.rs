use crate::llm::AnalysisError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Snapshot of the failing error, taken at capture time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFacts {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    /// Empty when stack collection is disabled or nothing was captured
    pub stack: String,
}

impl ErrorFacts {
    pub fn new(
        error_type: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// Identity of the intercepted unit of work
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub owner: String,
    pub method: String,
}

impl CallSite {
    pub fn new(owner: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            method: method.into(),
        }
    }

    /// `Owner.method`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.owner, self.method)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.method)
    }
}

/// A line in a source file, usually produced with `file!()` and `line!()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

/// Where the context builder may find the failing unit's source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SourceHint {
    #[default]
    None,
    /// Source text supplied verbatim by the caller
    Text(String),
    /// Read a window of lines around this location
    Location(SourceLocation),
}

/// Diagnostic facts about one failing invocation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub owner_name: String,
    pub method_name: String,
    pub arguments: Vec<Value>,
    pub source_snippet: Option<String>,
}

impl InvocationContext {
    pub fn qualified_method(&self) -> String {
        format!("{}.{}", self.owner_name, self.method_name)
    }
}

/// The `context` object of a broadcast report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    pub method: String,
    pub arguments: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snippet: Option<String>,
}

/// Result of analyzing one failure. This is also the broadcast wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub error: ErrorFacts,
    pub analysis: String,
    pub context: ReportContext,
}

impl AnalysisReport {
    pub fn new(error: ErrorFacts, analysis: String, context: &InvocationContext) -> Self {
        Self {
            error,
            analysis,
            context: ReportContext {
                method: context.qualified_method(),
                arguments: context.arguments.clone(),
                source_snippet: context.source_snippet.clone(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The fallback provider failed as well. This is the only pipeline failure
/// that reaches the interceptor's caller.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Error analysis failed: {fallback}")]
pub struct AnalysisPipelineError {
    /// Failure of the configured provider, if it was attempted
    pub primary: Option<AnalysisError>,
    pub fallback: AnalysisError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_context() -> InvocationContext {
        InvocationContext {
            owner_name: "OrderService".to_string(),
            method_name: "place".to_string(),
            arguments: vec![json!(42), json!({"sku": "A-1"})],
            source_snippet: None,
        }
    }

    #[test]
    fn test_report_wire_format() {
        let report = AnalysisReport::new(
            ErrorFacts::new("Error", "boom", ""),
            "Mock Analysis: ok".to_string(),
            &sample_context(),
        );

        let value: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "error": { "type": "Error", "message": "boom", "stack": "" },
                "analysis": "Mock Analysis: ok",
                "context": {
                    "method": "OrderService.place",
                    "arguments": [42, {"sku": "A-1"}]
                }
            })
        );
    }

    #[test]
    fn test_report_includes_snippet_when_present() {
        let mut context = sample_context();
        context.source_snippet = Some("fn place() {}".to_string());
        let report = AnalysisReport::new(ErrorFacts::new("E", "m", ""), "a".to_string(), &context);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["context"]["sourceSnippet"], "fn place() {}");

        let parsed: AnalysisReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_call_site_display() {
        let call_site = CallSite::new("ErrorHandler", "handle_not_found");
        assert_eq!(call_site.to_string(), "ErrorHandler.handle_not_found");
        assert_eq!(call_site.qualified(), call_site.to_string());
    }
}
