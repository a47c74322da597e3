//! Error types for registry access and version resolution.

use thiserror::Error;

/// Errors that can occur while talking to the package registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// Registry answered with a non-success status.
    #[error("registry returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Failed to parse JSON response.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Registry rate limit exceeded.
    #[error("registry rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited {
        /// Seconds until the limit resets.
        retry_after: u64,
    },
}

impl RegistryError {
    /// Returns a user-friendly error message suitable for a status line.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => {
                "Could not reach the package registry. Version list is unavailable."
            }
            Self::Status { .. } => "The package registry rejected the request.",
            Self::RateLimited { .. } => "Registry rate limit reached. Please try again later.",
            Self::JsonParse(_) => "The package registry sent an unexpected response.",
        }
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::JsonParse(_) => false,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::JsonParse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = RegistryError::Network("connection refused".to_string());
        assert!(err.user_message().contains("registry"));

        let err = RegistryError::RateLimited { retry_after: 30 };
        assert!(err.user_message().contains("rate limit"));
    }

    #[test]
    fn test_retryable() {
        assert!(RegistryError::Network("timeout".to_string()).is_retryable());
        assert!(RegistryError::RateLimited { retry_after: 60 }.is_retryable());
        assert!(
            RegistryError::Status {
                status: 503,
                url: "https://example.test".to_string()
            }
            .is_retryable()
        );
        assert!(
            !RegistryError::Status {
                status: 404,
                url: "https://example.test".to_string()
            }
            .is_retryable()
        );
        assert!(!RegistryError::JsonParse("eof".to_string()).is_retryable());
    }
}
