//! Validation of JSON text against a compiled schema.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use zt_eval::{SchemaHandle, compile};
use zt_loader::LoadedModule;
use zt_schema::ParseOutcome;

use crate::result::ValidationResult;

/// Parse `json_text` and run the schema's non-throwing parse on it.
///
/// The schema is never invoked when the text is not JSON. A user callback
/// that throws while parsing is reported as a compile error.
pub fn validate(handle: &SchemaHandle, json_text: &str) -> ValidationResult {
    let input: Value = match serde_json::from_str(json_text) {
        Ok(input) => input,
        Err(err) => {
            debug!(error = %err, "Input is not JSON");
            return ValidationResult::JsonParseError {
                message: err.to_string(),
            };
        }
    };

    let result = match handle.safe_parse(Some(&input)) {
        Ok(ParseOutcome::Success(value)) => ValidationResult::Success { value },
        Ok(ParseOutcome::Failure(issues)) => ValidationResult::ValidationFailure {
            issues,
            generation: handle.generation(),
        },
        Err(err) => ValidationResult::CompileError {
            message: err.message,
        },
    };
    debug!(
        version = handle.version(),
        outcome = result.label(),
        "Validated input"
    );
    result
}

/// Compile `source` against `module`, then validate `json_text`.
pub fn run(source: &str, module: &Arc<LoadedModule>, json_text: &str) -> ValidationResult {
    match compile(source, module) {
        Ok(handle) => validate(&handle, json_text),
        Err(err) => ValidationResult::CompileError {
            message: err.to_string(),
        },
    }
}
