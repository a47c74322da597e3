//! Configuration for registry access.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default registry API base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://data.jsdelivr.com/v1";

/// Default library package name.
pub const DEFAULT_PACKAGE: &str = "zod";

/// Version used when the registry has no usable `latest` tag.
pub const FALLBACK_VERSION: &str = "3.24.2";

/// Default metadata cache lifetime.
pub const DEFAULT_TTL_HOURS: u64 = 24;

/// Majors 1 and 2 have no non-throwing parse, so they are never offered.
pub const DEFAULT_MIN_SUPPORTED_MAJOR: u32 = 3;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Settings for [`crate::VersionResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Registry API base URL, without trailing slash.
    pub registry_url: String,

    /// Package name on the registry.
    pub package: String,

    /// How long a fetched listing stays fresh.
    pub ttl_hours: u64,

    /// Versions with a lower major are excluded from listings.
    pub min_supported_major: u32,

    /// Default version when `latest` cannot be resolved.
    pub fallback_version: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            package: DEFAULT_PACKAGE.to_string(),
            ttl_hours: DEFAULT_TTL_HOURS,
            min_supported_major: DEFAULT_MIN_SUPPORTED_MAJOR,
            fallback_version: FALLBACK_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RegistrySettings {
    /// Settings pointing at a different registry, e.g. a mock server.
    #[must_use]
    pub fn with_registry_url(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: registry_url.into(),
            ..Default::default()
        }
    }

    /// URL of the package metadata endpoint.
    #[must_use]
    pub fn metadata_url(&self) -> String {
        format!(
            "{}/packages/npm/{}",
            self.registry_url.trim_end_matches('/'),
            self.package
        )
    }

    /// Cache lifetime as a chrono duration.
    #[must_use]
    pub fn ttl(&self) -> chrono::Duration {
        i64::try_from(self.ttl_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
