//! Session query string: `schema`, `json` and `result` tokens plus a raw
//! `version`.

use tracing::debug;
use url::form_urlencoded;

use crate::codec::encode_text;
use crate::state::{DEFAULT_JSON, DEFAULT_RESULT, DEFAULT_SCHEMA, EncodedState, ShareableState, decode};

/// Query key of the schema token.
pub const SCHEMA_KEY: &str = "schema";
/// Query key of the JSON token.
pub const JSON_KEY: &str = "json";
/// Query key of the result token.
pub const RESULT_KEY: &str = "result";
/// Query key of the selected version.
pub const VERSION_KEY: &str = "version";

/// State restored from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    /// Decoded panes.
    pub state: ShareableState,
    /// Selected version, if any.
    pub version: Option<String>,
}

/// Build a query string for `state`; fields equal to their default are left
/// out.
#[must_use]
pub fn to_query(state: &ShareableState, version: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, text, default) in [
        (SCHEMA_KEY, &state.schema_text, DEFAULT_SCHEMA),
        (JSON_KEY, &state.json_text, DEFAULT_JSON),
        (RESULT_KEY, &state.result_text, DEFAULT_RESULT),
    ] {
        if text != default {
            query.append_pair(key, &encode_text(text));
        }
    }
    if let Some(version) = version.filter(|v| !v.is_empty()) {
        query.append_pair(VERSION_KEY, version);
    }
    query.finish()
}

/// Parse a query string, with or without a leading `?`.
///
/// Unknown keys are ignored; for repeated keys the last one wins.
#[must_use]
pub fn from_query(query: &str) -> SessionQuery {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut tokens = EncodedState::default();
    let mut version = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();
        match key.as_ref() {
            SCHEMA_KEY => tokens.schema = Some(value),
            JSON_KEY => tokens.json = Some(value),
            RESULT_KEY => tokens.result = Some(value),
            VERSION_KEY => version = Some(value).filter(|v| !v.is_empty()),
            other => debug!(key = other, "Ignoring unknown query key"),
        }
    }
    SessionQuery {
        state: decode(&tokens),
        version,
    }
}
