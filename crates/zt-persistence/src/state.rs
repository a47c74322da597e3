//! Shareable playground state and its encoded form.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{decode_text, encode_text};

/// Schema text shown on first load.
pub const DEFAULT_SCHEMA: &str = "z.object({\n    key: z.string()\n})";

/// JSON text shown on first load.
pub const DEFAULT_JSON: &str = "{\n    \"key\": \"value\"\n}";

/// Result text shown on first load.
pub const DEFAULT_RESULT: &str = "";

/// The three text panes of the playground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareableState {
    /// Schema source.
    pub schema_text: String,
    /// JSON input.
    pub json_text: String,
    /// Last rendered result.
    pub result_text: String,
}

impl Default for ShareableState {
    fn default() -> Self {
        Self {
            schema_text: DEFAULT_SCHEMA.to_string(),
            json_text: DEFAULT_JSON.to_string(),
            result_text: DEFAULT_RESULT.to_string(),
        }
    }
}

impl ShareableState {
    /// Create a state from the three texts.
    pub fn new(
        schema_text: impl Into<String>,
        json_text: impl Into<String>,
        result_text: impl Into<String>,
    ) -> Self {
        Self {
            schema_text: schema_text.into(),
            json_text: json_text.into(),
            result_text: result_text.into(),
        }
    }
}

/// Per-field tokens; `None` is an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Schema token.
    pub schema: Option<String>,
    /// JSON token.
    pub json: Option<String>,
    /// Result token.
    pub result: Option<String>,
}

/// Encode every field of `state`.
#[must_use]
pub fn encode(state: &ShareableState) -> EncodedState {
    EncodedState {
        schema: Some(encode_text(&state.schema_text)),
        json: Some(encode_text(&state.json_text)),
        result: Some(encode_text(&state.result_text)),
    }
}

/// Decode each field independently; a missing or malformed token yields the
/// field's default.
#[must_use]
pub fn decode(tokens: &EncodedState) -> ShareableState {
    ShareableState {
        schema_text: decode_field("schema", tokens.schema.as_deref(), DEFAULT_SCHEMA),
        json_text: decode_field("json", tokens.json.as_deref(), DEFAULT_JSON),
        result_text: decode_field("result", tokens.result.as_deref(), DEFAULT_RESULT),
    }
}

fn decode_field(field: &str, token: Option<&str>, default: &str) -> String {
    let Some(token) = token else {
        return default.to_string();
    };
    match decode_text(token) {
        Ok(text) => text,
        Err(err) => {
            debug!(field, error = %err, "Falling back to default for undecodable field");
            default.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokens_use_defaults() {
        assert_eq!(decode(&EncodedState::default()), ShareableState::default());
    }

    #[test]
    fn test_bad_field_does_not_affect_others() {
        let state = ShareableState::new("z.number()", "42", "42");
        let mut tokens = encode(&state);
        tokens.json = Some("%%%".to_string());
        let decoded = decode(&tokens);
        assert_eq!(decoded.schema_text, "z.number()");
        assert_eq!(decoded.json_text, DEFAULT_JSON);
        assert_eq!(decoded.result_text, "42");
    }

    #[test]
    fn test_encoding_is_stable() {
        let state = ShareableState::default();
        assert_eq!(encode(&state), encode(&decode(&encode(&state))));
    }
}
