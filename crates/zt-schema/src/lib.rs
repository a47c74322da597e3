//! The validation library surface, compiled in per API generation.
//!
//! A [`Library`] is one loaded instance of the library. It builds
//! [`Schema`] values whose non-throwing parse reports [`Issue`]s with the
//! codes, messages and field layout of its [`ApiGeneration`].
//!
//! ```
//! use serde_json::json;
//! use zt_schema::{ApiGeneration, Library, ParseOutcome};
//!
//! let z = Library::new("3.24.2", ApiGeneration::V3);
//! let schema = z.object(vec![("key".to_string(), z.string())]);
//! let outcome = schema.safe_parse(Some(&json!({"key": "value"}))).unwrap();
//! assert_eq!(outcome, ParseOutcome::Success(Some(json!({"key": "value"}))));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checks;
pub mod error;
pub mod generation;
pub mod issue;
pub mod library;
pub mod parse;
pub mod schema;
pub mod value;

pub use checks::{NumberCheck, NumberCheckKind, StringCheck, StringCheckKind, compile_js_regex};
pub use error::{CallbackError, Result, SchemaError};
pub use generation::{ApiGeneration, major_version};
pub use issue::{Issue, IssueKind, PathSegment, SizeOrigin, StringFormat, error_json};
pub use library::{COERCE_EXPORTS, Library, LibraryId};
pub use parse::ParseOutcome;
pub use schema::{Callback, Schema, SchemaKind, UnknownKeys};
