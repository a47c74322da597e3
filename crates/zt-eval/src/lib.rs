//! Schema source compilation.
//!
//! Source text is a single expression evaluated with only the library
//! namespace in scope, under the names `z` and `zod`. Anything else is a
//! `ReferenceError`, and a result that is not a schema of the active
//! library instance is rejected with [`NOT_A_SCHEMA`].
//!
//! ```
//! use std::sync::Arc;
//! use zt_eval::compile;
//! use zt_loader::LoadedModule;
//! use zt_schema::ApiGeneration;
//!
//! let module = Arc::new(LoadedModule::new("3.24.2", "zod@3.24.2", ApiGeneration::V3));
//! let handle = compile("z.object({ key: z.string().min(1) });", &module).unwrap();
//! assert_eq!(handle.version(), "3.24.2");
//!
//! let err = compile("window", &module).unwrap_err();
//! assert_eq!(err.to_string(), "window is not defined");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod callback;
pub mod compiler;
pub mod error;
pub mod guard;
pub mod interp;
pub mod lexer;
pub mod methods;
pub mod parser;
pub mod value;

pub use callback::FunctionCallback;
pub use compiler::{SchemaHandle, compile, evaluate, normalize_source, typecheck};
pub use error::{CompileError, ErrorKind, NOT_A_SCHEMA, Result};
pub use value::Value;
