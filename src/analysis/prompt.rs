use crate::analysis::types::{ErrorFacts, InvocationContext};

const STACK_TRACE_UNAVAILABLE: &str = "Not available";

/// Render the analysis prompt. Pure: identical inputs give byte-identical output.
pub fn render(facts: &ErrorFacts, context: &InvocationContext) -> String {
    let stack = if facts.stack.trim().is_empty() {
        STACK_TRACE_UNAVAILABLE
    } else {
        facts.stack.as_str()
    };

    let mut prompt = format!(
        "As an AI debugging assistant, analyze this error:\n\
         \n\
         Error Type: {}\n\
         Error Message: {}\n\
         Method: {}\n\
         Stack Trace: {}\n",
        facts.error_type,
        facts.message,
        context.qualified_method(),
        stack,
    );

    if let Some(snippet) = context.source_snippet.as_deref() {
        prompt.push_str("\nSource Code:\n```\n");
        prompt.push_str(snippet);
        prompt.push_str("\n```\n");
    }

    prompt.push_str(
        "\nPlease provide:\n\
         1. Root cause analysis\n\
         2. Potential solutions\n\
         3. Best practices to prevent this error\n\
         4. Code example for fix if possible\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(snippet: Option<&str>) -> InvocationContext {
        InvocationContext {
            owner_name: "ErrorHandler".to_string(),
            method_name: "handle_not_found".to_string(),
            arguments: vec![json!("/missing")],
            source_snippet: snippet.map(str::to_string),
        }
    }

    #[test]
    fn test_render_without_snippet() {
        let facts = ErrorFacts::new("Error", "Resource not found: /missing", "");
        let prompt = render(&facts, &context(None));

        assert_eq!(
            prompt,
            "As an AI debugging assistant, analyze this error:\n\
             \n\
             Error Type: Error\n\
             Error Message: Resource not found: /missing\n\
             Method: ErrorHandler.handle_not_found\n\
             Stack Trace: Not available\n\
             \n\
             Please provide:\n\
             1. Root cause analysis\n\
             2. Potential solutions\n\
             3. Best practices to prevent this error\n\
             4. Code example for fix if possible\n"
        );
    }

    #[test]
    fn test_render_with_snippet_and_stack() {
        let facts = ErrorFacts::new("ParseError", "bad digit", "ParseError: bad digit");
        let prompt = render(&facts, &context(Some("let n: u32 = s.parse()?;")));

        assert!(prompt.contains("Stack Trace: ParseError: bad digit\n"));
        assert!(prompt.contains("\nSource Code:\n```\nlet n: u32 = s.parse()?;\n```\n"));
        assert!(prompt.ends_with("4. Code example for fix if possible\n"));
    }

    #[test]
    fn test_render_is_pure() {
        let facts = ErrorFacts::new("Error", "boom", "Error: boom");
        let ctx = context(Some("snippet"));
        assert_eq!(render(&facts, &ctx), render(&facts.clone(), &ctx.clone()));
    }
}
