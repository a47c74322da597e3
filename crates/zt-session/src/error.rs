//! Session errors.

use thiserror::Error;
use zt_loader::LoadError;
use zt_registry::RegistryError;

/// Errors surfaced by [`crate::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// Validation was requested before any library version finished loading.
    #[error("no library version is loaded yet")]
    NotReady,

    /// The selected version could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The registry client could not be created.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl SessionError {
    /// Returns a user-friendly error message suitable for a status line.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::NotReady => "Still loading the validation library. Try again in a moment.",
            Self::Load(err) => err.user_message(),
            Self::Registry(err) => err.user_message(),
        }
    }

    /// Returns whether retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotReady => true,
            Self::Load(err) => err.is_retryable(),
            Self::Registry(err) => err.is_retryable(),
        }
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
