//! Compile errors.

use std::fmt;

use thiserror::Error;
use zt_schema::{CallbackError, SchemaError};

/// Message for a source that evaluates to something other than a schema of
/// the active library instance.
pub const NOT_A_SCHEMA: &str = "Input is not an instance of the validation library's schema type";

/// The exception class an error would have been thrown as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source.
    Syntax,
    /// Undeclared identifier.
    Reference,
    /// Operation on a value of the wrong type.
    Type,
    /// Evaluation nested too deeply.
    Range,
    /// Any other thrown error.
    Error,
}

impl ErrorKind {
    /// Constructor name of the exception.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Syntax => "SyntaxError",
            Self::Reference => "ReferenceError",
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Error => "Error",
        }
    }

    /// Kind for a constructor name; unknown names are plain `Error`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "SyntaxError" => Self::Syntax,
            "ReferenceError" => Self::Reference,
            "TypeError" => Self::Type,
            "RangeError" => Self::Range,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure to turn source text into a schema.
///
/// Displays as the bare exception message, which is what the playground
/// shows in its result pane.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    /// Exception class.
    pub kind: ErrorKind,
    /// Exception message.
    pub message: String,
}

impl CompileError {
    /// Create an error of `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// `SyntaxError`
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    /// `TypeError`
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    /// `ReferenceError` for an undeclared name.
    pub fn not_defined(name: &str) -> Self {
        Self::new(ErrorKind::Reference, format!("{name} is not defined"))
    }

    /// The value is not a schema of the active library.
    #[must_use]
    pub fn not_a_schema() -> Self {
        Self::new(ErrorKind::Error, NOT_A_SCHEMA)
    }

    /// `Name: message`, as a console would print it.
    #[must_use]
    pub fn to_console_string(&self) -> String {
        format!("{}: {}", self.kind, self.message)
    }
}

impl From<SchemaError> for CompileError {
    fn from(err: SchemaError) -> Self {
        let kind = match err {
            SchemaError::InvalidRegex { .. } => ErrorKind::Syntax,
            SchemaError::UnsupportedMethod { .. } => ErrorKind::Type,
            _ => ErrorKind::Error,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<CallbackError> for CompileError {
    fn from(err: CallbackError) -> Self {
        Self::new(ErrorKind::from_name(&err.name), err.message)
    }
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_error_keeps_class() {
        let err = CompileError::from(CallbackError::named("RangeError", "too deep"));
        assert_eq!(err.kind, ErrorKind::Range);
        let err = CompileError::from(CallbackError::new("boom"));
        assert_eq!(err.kind, ErrorKind::Error);
    }

    #[test]
    fn test_display_is_bare_message() {
        let err = CompileError::not_defined("foo");
        assert_eq!(err.to_string(), "foo is not defined");
        assert_eq!(err.to_console_string(), "ReferenceError: foo is not defined");
    }

    #[test]
    fn test_schema_error_kinds() {
        let err: CompileError = SchemaError::UnsupportedMethod {
            method: "z.string(...).shape".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Type);

        let err: CompileError = SchemaError::EmptyEnum.into();
        assert_eq!(err.kind, ErrorKind::Error);
    }
}
