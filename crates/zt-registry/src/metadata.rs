//! Registry metadata types.
//!
//! Mirrors the package endpoint of the registry:
//! `{versions: [{version, links}], tags: {latest, next, ...}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Links published for each version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLinks {
    /// Registry URL for this version.
    #[serde(rename = "self", default)]
    pub self_link: String,
    /// URL listing the version's entrypoints.
    #[serde(default)]
    pub entrypoints: String,
    /// URL of the download statistics.
    #[serde(default)]
    pub stats: String,
}

/// One published version of the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryVersion {
    /// Version string as published (or normalized, once filtered).
    pub version: String,
    /// Registry links.
    #[serde(default)]
    pub links: VersionLinks,
}

impl LibraryVersion {
    /// Creates a version entry without links.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            links: VersionLinks::default(),
        }
    }
}

/// Tag name to version mapping (`latest` → `3.24.2`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap {
    tags: BTreeMap<String, String>,
}

impl TagMap {
    /// Build a tag map from `(tag, version)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tags: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Version the tag points to.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    /// The `latest` tag target.
    pub fn latest(&self) -> Option<&str> {
        self.get("latest")
    }

    /// Iterate over tag names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    /// Whether `version` is literally the target of some tag.
    pub fn is_target(&self, version: &str) -> bool {
        self.tags.values().any(|v| v == version)
    }

    /// Tags that point at `version`.
    pub fn tags_for(&self, version: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(_, v)| v.as_str() == version)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Raw registry response for a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    /// Versions, newest first as published by the registry.
    #[serde(default)]
    pub versions: Vec<LibraryVersion>,
    /// Tag map.
    #[serde(default)]
    pub tags: TagMap,
}
