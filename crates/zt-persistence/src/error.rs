//! Decode error types.
//!
//! Decode failures never reach the user: the affected field falls back to
//! its default. The messages here only feed debug logging.

use thiserror::Error;

/// Failure to turn a token back into text.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Token is not URL-safe base64.
    #[error("Token is not valid base64")]
    Base64(#[from] base64::DecodeError),

    /// Compressed payload is corrupt or truncated.
    #[error("Failed to inflate token")]
    Inflate(#[source] std::io::Error),

    /// Inflated payload exceeds the size limit.
    #[error("Decoded text exceeds {limit} bytes")]
    TooLarge {
        /// Limit in bytes.
        limit: u64,
    },

    /// Inflated payload is not UTF-8.
    #[error("Decoded text is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl DecodeError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Base64(_) => "The link contains characters that are not part of a share token.".to_string(),
            Self::Inflate(_) => "The link is truncated or was not created by this tool.".to_string(),
            Self::TooLarge { limit } => {
                format!("The shared text is larger than the {limit} byte limit.")
            }
            Self::Utf8(_) => "The shared text is not valid UTF-8.".to_string(),
        }
    }
}

/// Result type alias for decode operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
