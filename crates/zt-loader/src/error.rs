//! Error types for module and declaration loading.

use thiserror::Error;

/// Errors that can occur while loading a library version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The version's major has no compiled-in library surface.
    #[error("version {0} is not supported (only majors 3 and 4 can be loaded)")]
    UnsupportedVersion(String),

    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The CDN answered with a non-success status.
    #[error("CDN returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },
}

impl LoadError {
    /// Returns a user-friendly error message suitable for a status line.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::UnsupportedVersion(_) => "This library version cannot be loaded.",
            Self::Network(_) => "Could not reach the CDN. Check your connection.",
            Self::Status { status: 404, .. } => "This library version does not exist on the CDN.",
            Self::Status { .. } => "The CDN rejected the request.",
        }
    }

    /// Returns whether the requested file definitely does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. } | Self::UnsupportedVersion(_))
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::UnsupportedVersion(_) => false,
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = LoadError::Status {
            status: 404,
            url: "https://cdn.test/zod@9.9.9/+esm".to_string(),
        };
        assert!(err.user_message().contains("does not exist"));
        assert!(!err.is_retryable());
        assert!(err.is_not_found());
    }

    #[test]
    fn test_retryable() {
        assert!(LoadError::Network("reset".to_string()).is_retryable());
        assert!(!LoadError::UnsupportedVersion("2.0.0".to_string()).is_retryable());
        assert!(!LoadError::Network("reset".to_string()).is_not_found());
        let unavailable = LoadError::Status {
            status: 503,
            url: "https://cdn.test/zod@3.24.2/lib/types.d.ts".to_string(),
        };
        assert!(!unavailable.is_not_found());
    }
}
