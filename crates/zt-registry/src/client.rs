//! HTTP client for the package registry.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::config::RegistrySettings;
use crate::error::{RegistryError, Result};
use crate::metadata::RegistryMetadata;

/// User agent string for registry requests.
pub const USER_AGENT_VALUE: &str = concat!("zod-tester/", env!("CARGO_PKG_VERSION"));

/// Registry API client.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    metadata_url: String,
}

impl RegistryClient {
    /// Creates a new client for the package configured in `settings`.
    pub fn new(settings: &RegistrySettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()
            .map_err(|e| RegistryError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            metadata_url: settings.metadata_url(),
        })
    }

    /// URL this client fetches metadata from.
    pub fn metadata_url(&self) -> &str {
        &self.metadata_url
    }

    /// Fetches `{versions, tags}` for the package.
    pub async fn fetch_metadata(&self) -> Result<RegistryMetadata> {
        tracing::debug!("Fetching registry metadata from {}", self.metadata_url);

        let response = self.client.get(&self.metadata_url).send().await?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<RegistryMetadata> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(RegistryError::RateLimited { retry_after });
        }

        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                url: self.metadata_url.clone(),
            });
        }

        // Read as text first so a malformed body reports a JSON error
        let body = response.text().await?;
        let metadata: RegistryMetadata = serde_json::from_str(&body)?;

        Ok(metadata)
    }
}
