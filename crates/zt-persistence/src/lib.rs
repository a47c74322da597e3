//! Shareable state for the schema playground.
//!
//! Each text pane is deflate-compressed and encoded as unpadded URL-safe
//! base64 so the whole session fits in a link. Decoding never fails: a
//! missing or damaged field quietly falls back to its default.
//!
//! ```
//! use zt_persistence::{ShareableState, from_query, to_query};
//!
//! let state = ShareableState::new("z.number()", "42", "42");
//! let query = to_query(&state, Some("3.24.2"));
//! let restored = from_query(&query);
//! assert_eq!(restored.state, state);
//! assert_eq!(restored.version.as_deref(), Some("3.24.2"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod query;
pub mod state;

pub use codec::{MAX_DECODED_BYTES, decode_text, encode_text};
pub use error::{DecodeError, Result};
pub use query::{JSON_KEY, RESULT_KEY, SCHEMA_KEY, SessionQuery, VERSION_KEY, from_query, to_query};
pub use state::{
    DEFAULT_JSON, DEFAULT_RESULT, DEFAULT_SCHEMA, EncodedState, ShareableState, decode, encode,
};
