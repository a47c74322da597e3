//! Error types for schema construction and callbacks.

use thiserror::Error;

/// Errors raised while building a schema.
///
/// These surface when the schema source calls a constructor with arguments
/// the library rejects, before any data is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// A regular expression could not be compiled.
    #[error("Invalid regular expression: /{source_text}/: {reason}")]
    InvalidRegex {
        /// Pattern source.
        source_text: String,
        /// Compiler message.
        reason: String,
    },

    /// `enum` called without values.
    #[error("Enum must have at least one value")]
    EmptyEnum,

    /// A discriminated union option lacks a literal discriminator.
    #[error("A discriminator value for key `{discriminator}` could not be extracted from all schema options")]
    MissingDiscriminator {
        /// Discriminator key.
        discriminator: String,
    },

    /// Two discriminated union options share a discriminator value.
    #[error("Discriminator property {discriminator} has duplicate value {value}")]
    DuplicateDiscriminator {
        /// Discriminator key.
        discriminator: String,
        /// Duplicated value.
        value: String,
    },

    /// A method was called on a schema kind that does not have it.
    #[error("{method} is not a function")]
    UnsupportedMethod {
        /// Method name.
        method: String,
    },

    /// A key passed to `pick` or `omit` is not in the shape.
    #[error("Unrecognized key: \"{0}\"")]
    UnknownKey(String),
}

/// An exception thrown by a user callback during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    /// Constructor name of the thrown exception, `Error` when unknown.
    pub name: String,
    /// The thrown message.
    pub message: String,
}

impl CallbackError {
    /// Create a callback error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    /// Create a callback error of a specific exception class.
    pub fn named(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for schema construction.
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = SchemaError::MissingDiscriminator {
            discriminator: "type".to_string(),
        };
        assert!(err.to_string().contains("`type`"));

        let err = SchemaError::InvalidRegex {
            source_text: "(?<=a)b".to_string(),
            reason: "look-around is not supported".to_string(),
        };
        assert!(err.to_string().starts_with("Invalid regular expression: /(?<=a)b/"));
    }
}
