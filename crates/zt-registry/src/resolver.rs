//! Version listing and default-version resolution.
//!
//! The resolver shapes what a version picker shows. It never decides what
//! can be loaded: a hidden pre-release stays loadable when named explicitly.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use zt_schema::major_version;

use crate::client::RegistryClient;
use crate::config::RegistrySettings;
use crate::error::Result;
use crate::metadata::{LibraryVersion, RegistryMetadata, TagMap};
use crate::version::normalize_version;

/// Versions offered for selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionListing {
    /// Filtered and normalized versions, in registry order.
    pub versions: Vec<LibraryVersion>,
    /// Raw tag map as reported by the registry.
    pub tags: TagMap,
    /// Set when the registry could not be reached; `versions` is then empty.
    pub degraded: bool,
    /// When the listing was fetched. `None` for degraded listings.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl VersionListing {
    fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::default()
        }
    }

    /// Normalized version strings, in order.
    pub fn version_strings(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.version.as_str()).collect()
    }

    /// Check if a normalized version is part of the listing.
    #[must_use]
    pub fn contains(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }

    /// The listed version matching the normalized `latest` tag, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&LibraryVersion> {
        let latest = normalize_version(self.tags.latest()?);
        self.versions.iter().find(|v| v.version == latest)
    }

    fn is_fresh(&self, ttl: chrono::Duration) -> bool {
        match self.fetched_at {
            Some(at) => Utc::now().signed_duration_since(at) < ttl,
            None => false,
        }
    }
}

/// Apply the picker rules to raw registry metadata.
///
/// A version that is literally the target of a tag is kept. Otherwise it is
/// dropped when any tag name occurs inside it (`3.22.0-beta.3` contains
/// `beta`). Survivors are normalized, then anything below `min_major` is
/// removed.
#[must_use]
pub fn filter_versions(metadata: &RegistryMetadata, min_major: u32) -> Vec<LibraryVersion> {
    metadata
        .versions
        .iter()
        .filter(|entry| {
            if metadata.tags.is_target(&entry.version) {
                return true;
            }
            !metadata
                .tags
                .names()
                .any(|tag| entry.version.contains(tag))
        })
        .map(|entry| LibraryVersion {
            version: normalize_version(&entry.version),
            links: entry.links.clone(),
        })
        .filter(|entry| major_version(&entry.version).is_some_and(|major| major >= min_major))
        .collect()
}

/// Resolves the selectable versions and the default version.
#[derive(Debug)]
pub struct VersionResolver {
    client: RegistryClient,
    settings: RegistrySettings,
    // Held across the fetch, so concurrent callers share one request.
    cache: Mutex<Option<VersionListing>>,
}

impl VersionResolver {
    /// Create a resolver from settings.
    pub fn new(settings: RegistrySettings) -> Result<Self> {
        let client = RegistryClient::new(&settings)?;
        Ok(Self {
            client,
            settings,
            cache: Mutex::new(None),
        })
    }

    /// Settings in use.
    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Current version listing.
    ///
    /// Served from cache while fresh. A registry failure yields an empty
    /// listing flagged `degraded`; it is not cached, so the next call retries.
    pub async fn list_versions(&self) -> VersionListing {
        let mut cache = self.cache.lock().await;

        if let Some(listing) = cache.as_ref()
            && listing.is_fresh(self.settings.ttl())
        {
            tracing::trace!("Serving version listing from cache");
            return listing.clone();
        }

        match self.client.fetch_metadata().await {
            Ok(metadata) => {
                let versions = filter_versions(&metadata, self.settings.min_supported_major);
                tracing::info!(
                    fetched = metadata.versions.len(),
                    listed = versions.len(),
                    "Version listing refreshed"
                );
                let listing = VersionListing {
                    versions,
                    tags: metadata.tags,
                    degraded: false,
                    fetched_at: Some(Utc::now()),
                };
                *cache = Some(listing.clone());
                listing
            }
            Err(e) => {
                tracing::warn!(
                    url = self.client.metadata_url(),
                    retryable = e.is_retryable(),
                    "Failed to fetch version listing: {e}"
                );
                VersionListing::degraded()
            }
        }
    }

    /// Default version: the listed `latest`, else the fallback.
    pub async fn resolve_default(&self) -> String {
        let listing = self.list_versions().await;
        match listing.latest() {
            Some(latest) => latest.version.clone(),
            None => {
                tracing::debug!(
                    fallback = %self.settings.fallback_version,
                    "No listed latest version, using fallback"
                );
                self.settings.fallback_version.clone()
            }
        }
    }

    /// Tag names pointing at `version` (raw or normalized).
    pub async fn tag_for(&self, version: &str) -> Vec<String> {
        let listing = self.list_versions().await;
        listing
            .tags
            .names()
            .filter(|tag| {
                listing
                    .tags
                    .get(tag)
                    .is_some_and(|target| target == version || normalize_version(target) == version)
            })
            .map(str::to_string)
            .collect()
    }

    /// Check if a version appears in the current listing.
    pub async fn is_listed(&self, version: &str) -> bool {
        self.list_versions().await.contains(version)
    }

    /// Drop the cached listing.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(versions: &[&str], tags: &[(&str, &str)]) -> RegistryMetadata {
        RegistryMetadata {
            versions: versions.iter().copied().map(LibraryVersion::new).collect(),
            tags: TagMap::from_pairs(tags.iter().copied()),
        }
    }

    fn listed(meta: &RegistryMetadata) -> Vec<String> {
        filter_versions(meta, 3)
            .into_iter()
            .map(|v| v.version)
            .collect()
    }

    #[test]
    fn test_untagged_pre_release_is_hidden() {
        let meta = metadata(
            &["3.24.2", "3.22.0-beta.3", "3.22.0"],
            &[("latest", "3.24.2"), ("beta", "3.23.0-beta.1")],
        );
        assert_eq!(listed(&meta), vec!["3.24.2", "3.22.0"]);
    }

    #[test]
    fn test_tag_target_is_kept_and_normalized() {
        let meta = metadata(
            &["3.24.2", "4.0.0-beta.20250412T085909"],
            &[("latest", "3.24.2"), ("beta", "4.0.0-beta.20250412T085909")],
        );
        assert_eq!(listed(&meta), vec!["3.24.2", "4.0.0-beta"]);
    }

    #[test]
    fn test_old_majors_are_excluded() {
        let meta = metadata(&["3.0.0", "2.5.0", "1.11.17"], &[("latest", "3.0.0")]);
        assert_eq!(listed(&meta), vec!["3.0.0"]);
    }

    #[test]
    fn test_listing_latest() {
        let listing = VersionListing {
            versions: vec![LibraryVersion::new("3.24.2"), LibraryVersion::new("3.24.1")],
            tags: TagMap::from_pairs([("latest", "3.24.2")]),
            degraded: false,
            fetched_at: Some(Utc::now()),
        };
        assert_eq!(listing.latest().map(|v| v.version.as_str()), Some("3.24.2"));
        assert!(listing.contains("3.24.1"));
    }

    #[test]
    fn test_degraded_listing_is_never_fresh() {
        let listing = VersionListing::degraded();
        assert!(listing.versions.is_empty());
        assert!(!listing.is_fresh(chrono::Duration::hours(24)));
    }

    #[test]
    fn test_stale_listing() {
        let listing = VersionListing {
            fetched_at: Some(Utc::now() - chrono::Duration::hours(25)),
            ..VersionListing::default()
        };
        assert!(!listing.is_fresh(chrono::Duration::hours(24)));
    }
}
