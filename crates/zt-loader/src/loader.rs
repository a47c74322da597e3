//! Version loader with per-version caching.

use std::sync::Arc;

use crate::cache::KeyedCache;
use crate::cdn::{CdnSettings, CdnSource};
use crate::declarations::candidate_paths;
use crate::error::{LoadError, Result};
use crate::source::{LoadedModule, ModuleSource};

/// Loads library versions and their declaration text.
///
/// Both caches are keyed by the exact version string and live for the
/// lifetime of the loader. Concurrent requests for one key share a single
/// fetch and its outcome; a failed load leaves its key empty so a later call
/// retries.
pub struct VersionLoader {
    source: Arc<dyn ModuleSource>,
    modules: KeyedCache<Arc<LoadedModule>, LoadError>,
    declarations: KeyedCache<String, LoadError>,
}

impl std::fmt::Debug for VersionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionLoader")
            .field("modules", &self.modules.keys())
            .field("declarations", &self.declarations.keys())
            .finish_non_exhaustive()
    }
}

impl VersionLoader {
    /// Loader backed by the CDN.
    pub fn new(settings: CdnSettings) -> Result<Self> {
        Ok(Self::with_source(Arc::new(CdnSource::new(settings)?)))
    }

    /// Loader backed by an arbitrary source.
    pub fn with_source(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            source,
            modules: KeyedCache::new(),
            declarations: KeyedCache::new(),
        }
    }

    /// Load exactly `version`.
    pub async fn load(&self, version: &str) -> Result<Arc<LoadedModule>> {
        if let Some(module) = self.modules.get(version) {
            tracing::trace!("Module cache hit for {}", version);
            return Ok(module);
        }

        let source = Arc::clone(&self.source);
        let owned = version.to_string();
        let result = self
            .modules
            .get_or_try_init(version, move || async move {
                tracing::info!("Loading library version {}", owned);
                source.resolve(&owned).await.map(Arc::new)
            })
            .await;

        if let Err(e) = &result {
            tracing::warn!("Failed to load version {}: {}", version, e);
        }
        result
    }

    /// Declaration text for `version`, or an empty string when no candidate
    /// path could be fetched.
    ///
    /// An empty result is cached only when every candidate is definitely
    /// absent. After a network or server failure the next call fetches again.
    pub async fn load_declarations(&self, version: &str) -> String {
        let source = Arc::clone(&self.source);
        let owned = version.to_string();
        let result = self
            .declarations
            .get_or_try_init(version, move || fetch_declarations(source, owned))
            .await;

        result.unwrap_or_else(|e| {
            tracing::warn!("Declarations for {} unavailable for now: {}", version, e);
            String::new()
        })
    }

    /// Versions with a loaded module, sorted.
    pub fn cached_versions(&self) -> Vec<String> {
        self.modules.keys()
    }

    /// Check if `version` is loaded.
    pub fn is_cached(&self, version: &str) -> bool {
        self.modules.contains(version)
    }
}

/// First candidate that fetches, `""` when all are absent, or the last
/// failure that might go away on retry.
async fn fetch_declarations(source: Arc<dyn ModuleSource>, version: String) -> Result<String> {
    let mut transient = None;
    for path in candidate_paths(&version) {
        match source.fetch_declarations(&version, path).await {
            Ok(text) => {
                tracing::debug!("Loaded declarations for {} from {}", version, path);
                return Ok(text);
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("No declarations for {} at {}", version, path);
            }
            Err(e) => {
                tracing::debug!("Declarations for {} at {} failed: {}", version, path, e);
                transient = Some(e);
            }
        }
    }
    transient.map_or_else(|| Ok(String::new()), Err)
}
