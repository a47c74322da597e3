//! The session coordinator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};
use zt_engine::{ValidationResult, validate};
use zt_eval::{SchemaHandle, compile};
use zt_loader::{CdnSettings, LoadedModule, VersionLoader};
use zt_persistence::{ShareableState, from_query, to_query};
use zt_registry::{RegistrySettings, VersionListing, VersionResolver};

use crate::error::{Result, SessionError};

/// What became of a version selection.
#[derive(Debug, Clone)]
pub enum Selection {
    /// The module is now current.
    Installed(Arc<LoadedModule>),
    /// A newer selection completed first; the module was loaded but not
    /// installed.
    Superseded(Arc<LoadedModule>),
}

impl Selection {
    /// The loaded module, installed or not.
    #[must_use]
    pub fn module(&self) -> &Arc<LoadedModule> {
        match self {
            Self::Installed(module) | Self::Superseded(module) => module,
        }
    }

    /// Check if the module became current.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed(_))
    }
}

/// One validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecord {
    /// Position in the session's run order, starting at 1.
    pub sequence: u64,
    /// Library version the run used.
    pub version: String,
    /// Outcome.
    pub result: ValidationResult,
}

#[derive(Debug, Default)]
struct SessionState {
    // Epoch handed to the most recent selection request.
    next_epoch: u64,
    // Epoch of the selection whose module is current.
    installed_epoch: u64,
    current: Option<Arc<LoadedModule>>,
    requested_version: Option<String>,
    active: Option<SchemaHandle>,
    texts: ShareableState,
    last: Option<ValidationRecord>,
    runs: u64,
}

/// Ties version selection, compilation, validation and sharing together.
///
/// All methods take `&self`; the session can be shared between tasks.
#[derive(Debug)]
pub struct Session {
    resolver: VersionResolver,
    loader: VersionLoader,
    state: Mutex<SessionState>,
}

impl Session {
    /// Create a session from its two services.
    pub fn new(resolver: VersionResolver, loader: VersionLoader) -> Self {
        Self {
            resolver,
            loader,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Create a session talking to the configured registry and CDN.
    pub fn from_settings(registry: RegistrySettings, cdn: CdnSettings) -> Result<Self> {
        Ok(Self::new(
            VersionResolver::new(registry)?,
            VersionLoader::new(cdn)?,
        ))
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The version resolver.
    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// The module loader.
    pub fn loader(&self) -> &VersionLoader {
        &self.loader
    }

    /// Versions offered for selection.
    pub async fn versions(&self) -> VersionListing {
        self.resolver.list_versions().await
    }

    /// Load `version` and make it current unless a newer selection has
    /// already been installed.
    pub async fn select_version(&self, version: &str) -> Result<Selection> {
        let epoch = {
            let mut state = self.lock();
            state.next_epoch += 1;
            state.requested_version = Some(version.to_string());
            state.next_epoch
        };
        debug!(version, epoch, "Selecting version");

        let module = self.loader.load(version).await?;

        let mut state = self.lock();
        if epoch < state.installed_epoch {
            debug!(
                version,
                epoch,
                installed = state.installed_epoch,
                "Selection superseded"
            );
            return Ok(Selection::Superseded(module));
        }
        state.installed_epoch = epoch;
        state.current = Some(Arc::clone(&module));
        state.active = None;
        info!(version = module.version(), "Library version ready");
        Ok(Selection::Installed(module))
    }

    /// Select the default version from the registry, or the fallback.
    pub async fn select_default(&self) -> Result<Selection> {
        let version = self.resolver.resolve_default().await;
        self.select_version(&version).await
    }

    /// The current module, if one has loaded.
    pub fn current(&self) -> Option<Arc<LoadedModule>> {
        self.lock().current.clone()
    }

    /// Version of the current module.
    pub fn current_version(&self) -> Option<String> {
        self.lock().current.as_ref().map(|m| m.version().to_string())
    }

    /// Version most recently asked for, loaded or not.
    pub fn requested_version(&self) -> Option<String> {
        self.lock().requested_version.clone()
    }

    /// Type declarations for the current version; empty when unavailable.
    pub async fn declarations(&self) -> Result<String> {
        let module = self.current().ok_or(SessionError::NotReady)?;
        Ok(self.loader.load_declarations(module.version()).await)
    }

    /// Compile `source` against the current module and validate `json`.
    ///
    /// Fails with [`SessionError::NotReady`] before any module has loaded.
    pub fn validate(&self, source: &str, json: &str) -> Result<ValidationRecord> {
        let module = self.current().ok_or(SessionError::NotReady)?;

        let (handle, result) = match compile(source, &module) {
            Ok(handle) => {
                let result = validate(&handle, json);
                (Some(handle), result)
            }
            Err(err) => (
                None,
                ValidationResult::CompileError {
                    message: err.to_string(),
                },
            ),
        };

        let mut state = self.lock();
        state.runs += 1;
        let record = ValidationRecord {
            sequence: state.runs,
            version: module.version().to_string(),
            result,
        };
        state.active = handle;
        state.texts = ShareableState::new(source, json, record.result.render());
        state.last = Some(record.clone());
        debug!(
            sequence = record.sequence,
            outcome = record.result.label(),
            "Recorded validation"
        );
        Ok(record)
    }

    /// Validate the session's own schema and JSON texts.
    pub fn validate_current(&self) -> Result<ValidationRecord> {
        let texts = self.texts();
        self.validate(&texts.schema_text, &texts.json_text)
    }

    /// Schema handle of the last successful compilation for the current
    /// module.
    pub fn active_schema(&self) -> Option<SchemaHandle> {
        self.lock().active.clone()
    }

    /// Most recent validation.
    pub fn last_result(&self) -> Option<ValidationRecord> {
        self.lock().last.clone()
    }

    /// Current pane texts.
    pub fn texts(&self) -> ShareableState {
        self.lock().texts.clone()
    }

    /// Replace the schema text.
    pub fn set_schema_text(&self, text: impl Into<String>) {
        self.lock().texts.schema_text = text.into();
    }

    /// Replace the JSON text.
    pub fn set_json_text(&self, text: impl Into<String>) {
        self.lock().texts.json_text = text.into();
    }

    /// Restore the default texts and clear the last result.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.texts = ShareableState::default();
        state.active = None;
        state.last = None;
        debug!("Session reset");
    }

    /// Query string that restores the current texts and version.
    pub fn share_query(&self) -> String {
        let state = self.lock();
        let version = state
            .current
            .as_ref()
            .map(|m| m.version().to_string())
            .or_else(|| state.requested_version.clone());
        to_query(&state.texts, version.as_deref())
    }

    /// Adopt the texts from a query string; returns its version, if any,
    /// for the caller to select.
    pub fn apply_query(&self, query: &str) -> Option<String> {
        let restored = from_query(query);
        self.lock().texts = restored.state;
        restored.version
    }
}
