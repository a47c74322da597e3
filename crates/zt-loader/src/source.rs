//! Module sources: where a library version comes from.

use std::sync::Arc;

use async_trait::async_trait;
use zt_schema::{ApiGeneration, Library};

use crate::error::Result;

/// A loaded library version.
///
/// Handles are shared as `Arc<LoadedModule>` and never mutated, so a module
/// stays usable after a newer one has been installed elsewhere.
#[derive(Debug)]
pub struct LoadedModule {
    version: String,
    entrypoint: String,
    library: Arc<Library>,
}

impl LoadedModule {
    /// Wrap a freshly instantiated library.
    pub fn new(version: impl Into<String>, entrypoint: impl Into<String>, generation: ApiGeneration) -> Self {
        let version = version.into();
        Self {
            library: Arc::new(Library::new(version.clone(), generation)),
            version,
            entrypoint: entrypoint.into(),
        }
    }

    /// Exact version requested.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// API generation of the library.
    pub fn generation(&self) -> ApiGeneration {
        self.library.generation()
    }

    /// URL the module was confirmed at.
    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    /// The library namespace.
    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }
}

/// Capability to resolve library versions and fetch their files.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    /// Load the module for exactly `version`.
    async fn resolve(&self, version: &str) -> Result<LoadedModule>;

    /// Fetch a file of the published package as text.
    async fn fetch_declarations(&self, version: &str, path: &str) -> Result<String>;
}
