//! CDN-backed module source.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use zt_schema::ApiGeneration;

use crate::error::{LoadError, Result};
use crate::source::{LoadedModule, ModuleSource};

/// Default CDN base URL.
pub const DEFAULT_CDN_URL: &str = "https://cdn.jsdelivr.net/npm";

/// User agent string for CDN requests.
const USER_AGENT_VALUE: &str = concat!("zod-tester/", env!("CARGO_PKG_VERSION"));

/// Settings for [`CdnSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnSettings {
    /// CDN base URL, without trailing slash.
    pub cdn_url: String,
    /// Package name on the CDN.
    pub package: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CdnSettings {
    fn default() -> Self {
        Self {
            cdn_url: DEFAULT_CDN_URL.to_string(),
            package: "zod".to_string(),
            timeout_secs: 15,
        }
    }
}

impl CdnSettings {
    /// Settings pointing at a different CDN, e.g. a mock server.
    #[must_use]
    pub fn with_cdn_url(cdn_url: impl Into<String>) -> Self {
        Self {
            cdn_url: cdn_url.into(),
            ..Default::default()
        }
    }

    /// URL of a file in the published package.
    #[must_use]
    pub fn file_url(&self, version: &str, path: &str) -> String {
        format!(
            "{}/{}@{}/{}",
            self.cdn_url.trim_end_matches('/'),
            self.package,
            version,
            path.trim_start_matches('/')
        )
    }

    /// URL of the ES module entrypoint.
    #[must_use]
    pub fn module_url(&self, version: &str) -> String {
        self.file_url(version, "+esm")
    }
}

/// Loads versions from a jsDelivr-style CDN.
///
/// A version is available when its ES module entrypoint answers with a
/// success status; the namespace itself is the compiled-in surface of the
/// version's API generation.
#[derive(Debug, Clone)]
pub struct CdnSource {
    client: reqwest::Client,
    settings: CdnSettings,
}

impl CdnSource {
    /// Creates a new CDN source.
    pub fn new(settings: CdnSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LoadError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &CdnSettings {
        &self.settings
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ModuleSource for CdnSource {
    async fn resolve(&self, version: &str) -> Result<LoadedModule> {
        let generation = ApiGeneration::for_version(version)
            .ok_or_else(|| LoadError::UnsupportedVersion(version.to_string()))?;

        let url = self.settings.module_url(version);
        tracing::debug!("Confirming module at {}", url);
        self.get(&url).await?;

        Ok(LoadedModule::new(version, url, generation))
    }

    async fn fetch_declarations(&self, version: &str, path: &str) -> Result<String> {
        let url = self.settings.file_url(version, path);
        tracing::debug!("Fetching declarations from {}", url);
        let response = self.get(&url).await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let settings = CdnSettings::with_cdn_url("http://localhost:9/npm/");
        assert_eq!(settings.module_url("3.24.2"), "http://localhost:9/npm/zod@3.24.2/+esm");
        assert_eq!(
            settings.file_url("3.24.2", "/lib/types.d.ts"),
            "http://localhost:9/npm/zod@3.24.2/lib/types.d.ts"
        );
    }

    #[tokio::test]
    async fn test_unsupported_major_skips_network() {
        // Port 9 is never contacted: the major check comes first
        let source = CdnSource::new(CdnSettings::with_cdn_url("http://127.0.0.1:9")).unwrap();
        let err = source.resolve("2.5.0").await.unwrap_err();
        assert_eq!(err, LoadError::UnsupportedVersion("2.5.0".to_string()));
    }
}
