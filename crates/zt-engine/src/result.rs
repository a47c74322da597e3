//! Validation outcome types.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use zt_schema::value::canonicalize;
use zt_schema::{ApiGeneration, Issue, error_json};

/// Indentation of rendered output.
pub const RENDER_INDENT: &[u8] = b"    ";

/// Outcome of validating one JSON document against one schema.
///
/// Every variant except [`ValidationResult::Success`] is shown with the
/// error flag set.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The input matched; `value` is the parsed output (`None` is `undefined`).
    Success {
        /// Canonicalized output.
        value: Option<Value>,
    },
    /// The input did not match.
    ValidationFailure {
        /// Issues in the order the library raised them.
        issues: Vec<Issue>,
        /// Generation whose serialization layout the issues use.
        generation: ApiGeneration,
    },
    /// The source did not produce a schema, or a user callback threw.
    CompileError {
        /// Displayed message.
        message: String,
    },
    /// The input text is not JSON.
    JsonParseError {
        /// Parser message.
        message: String,
    },
}

impl ValidationResult {
    /// Whether the result is displayed as an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Success { .. })
    }

    /// Short label for logs and the command line.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ValidationFailure { .. } => "validation failure",
            Self::CompileError { .. } => "compile error",
            Self::JsonParseError { .. } => "JSON parse error",
        }
    }

    /// Text shown in the result pane.
    ///
    /// Successes and failures are pretty-printed JSON with four-space
    /// indentation; errors are their bare message.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Success { value } => {
                render_json(&canonicalize(value.clone().unwrap_or(Value::Null)))
            }
            Self::ValidationFailure { issues, generation } => {
                render_json(&error_json(issues, *generation))
            }
            Self::CompileError { message } | Self::JsonParseError { message } => message.clone(),
        }
    }
}

/// Pretty-print `value` with four-space indentation.
#[must_use]
pub fn render_json(value: &Value) -> String {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(RENDER_INDENT));
    // Serializing a Value into memory cannot fail
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_uses_four_spaces() {
        let result = ValidationResult::Success {
            value: Some(json!({"key": "value"})),
        };
        assert_eq!(result.render(), "{\n    \"key\": \"value\"\n}");
        assert!(!result.is_error());
    }

    #[test]
    fn test_undefined_output_renders_null() {
        let result = ValidationResult::Success { value: None };
        assert_eq!(result.render(), "null");
    }

    #[test]
    fn test_errors_render_bare_message() {
        let result = ValidationResult::CompileError {
            message: "foo is not defined".to_string(),
        };
        assert_eq!(result.render(), "foo is not defined");
        assert!(result.is_error());
        assert_eq!(result.label(), "compile error");
    }

    #[test]
    fn test_empty_failure_still_renders_error_object() {
        let result = ValidationResult::ValidationFailure {
            issues: Vec::new(),
            generation: ApiGeneration::V3,
        };
        assert_eq!(
            result.render(),
            "{\n    \"issues\": [],\n    \"name\": \"ZodError\"\n}"
        );
    }
}
