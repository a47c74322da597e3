//! Validation engine for the schema playground.
//!
//! [`validate`] turns a compiled schema and a JSON document into a
//! [`ValidationResult`], and [`ValidationResult::render`] produces the text
//! shown to the user.
//!
//! ```
//! use std::sync::Arc;
//! use zt_engine::run;
//! use zt_loader::LoadedModule;
//! use zt_schema::ApiGeneration;
//!
//! let module = Arc::new(LoadedModule::new("3.24.2", "zod@3.24.2/+esm", ApiGeneration::V3));
//! let result = run("z.object({ key: z.string() })", &module, r#"{"key": "value"}"#);
//! assert!(!result.is_error());
//! assert_eq!(result.render(), "{\n    \"key\": \"value\"\n}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod result;

pub use engine::{run, validate};
pub use result::{RENDER_INDENT, ValidationResult, render_json};
