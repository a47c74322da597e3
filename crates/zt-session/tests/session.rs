//! Session coordination tests with an in-memory module source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zt_engine::ValidationResult;
use zt_loader::{LoadError, LoadedModule, ModuleSource, VersionLoader};
use zt_persistence::{DEFAULT_JSON, DEFAULT_SCHEMA};
use zt_registry::{FALLBACK_VERSION, RegistrySettings, VersionResolver};
use zt_schema::ApiGeneration;
use zt_session::{Session, SessionError};

/// Resolves any supported version; gated versions wait for a release.
#[derive(Default)]
struct GatedSource {
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl GatedSource {
    fn gate(&self, version: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(version.to_string(), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl ModuleSource for GatedSource {
    async fn resolve(&self, version: &str) -> zt_loader::Result<LoadedModule> {
        let gate = self.gates.lock().unwrap().get(version).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let generation = ApiGeneration::for_version(version)
            .ok_or_else(|| LoadError::UnsupportedVersion(version.to_string()))?;
        Ok(LoadedModule::new(version, format!("mock://{version}"), generation))
    }

    async fn fetch_declarations(&self, version: &str, path: &str) -> zt_loader::Result<String> {
        Ok(format!("// {version} {path}"))
    }
}

fn offline_resolver() -> VersionResolver {
    VersionResolver::new(RegistrySettings::with_registry_url("http://127.0.0.1:9")).unwrap()
}

fn session_with(source: Arc<GatedSource>) -> Session {
    Session::new(offline_resolver(), VersionLoader::with_source(source))
}

#[tokio::test]
async fn validate_before_load_is_not_ready() {
    let session = session_with(Arc::default());
    let err = session.validate(DEFAULT_SCHEMA, DEFAULT_JSON).unwrap_err();
    assert!(matches!(err, SessionError::NotReady));
    assert!(session.last_result().is_none());
}

#[tokio::test]
async fn newer_selection_wins_over_slower_older_one() {
    let source = Arc::new(GatedSource::default());
    let slow = source.gate("3.22.0");
    let session = session_with(source);

    let (older, newer) = tokio::join!(session.select_version("3.22.0"), async {
        let newer = session.select_version("4.1.5").await;
        slow.notify_one();
        newer
    });

    assert!(newer.unwrap().is_installed());
    let older = older.unwrap();
    assert!(!older.is_installed());
    assert_eq!(older.module().version(), "3.22.0");
    assert_eq!(session.current_version().as_deref(), Some("4.1.5"));
}

#[tokio::test]
async fn older_selection_installs_when_it_finishes_first() {
    let source = Arc::new(GatedSource::default());
    let slow = source.gate("4.1.5");
    let session = session_with(source);

    let (older, newer) = tokio::join!(
        async {
            let older = session.select_version("3.22.0").await;
            slow.notify_one();
            older
        },
        session.select_version("4.1.5")
    );

    assert!(older.unwrap().is_installed());
    assert!(newer.unwrap().is_installed());
    assert_eq!(session.current_version().as_deref(), Some("4.1.5"));
}

#[tokio::test]
async fn failed_selection_keeps_current_module() {
    let session = session_with(Arc::default());
    session.select_version("3.24.2").await.unwrap();
    let err = session.select_version("1.11.17").await.unwrap_err();
    assert!(matches!(err, SessionError::Load(LoadError::UnsupportedVersion(_))));
    assert_eq!(session.current_version().as_deref(), Some("3.24.2"));
    assert_eq!(session.requested_version().as_deref(), Some("1.11.17"));
}

#[tokio::test]
async fn validation_runs_are_numbered() {
    let session = session_with(Arc::default());
    session.select_version("3.24.2").await.unwrap();

    let first = session.validate(DEFAULT_SCHEMA, DEFAULT_JSON).unwrap();
    assert_eq!(first.sequence, 1);
    assert_eq!(first.version, "3.24.2");
    assert!(matches!(first.result, ValidationResult::Success { .. }));
    assert!(session.active_schema().is_some());

    let second = session.validate("nope", DEFAULT_JSON).unwrap();
    assert_eq!(second.sequence, 2);
    assert_eq!(second.result.render(), "nope is not defined");
    assert!(session.active_schema().is_none());
    assert_eq!(session.texts().result_text, "nope is not defined");
    assert_eq!(session.last_result(), Some(second));
}

#[tokio::test]
async fn switching_version_drops_active_schema() {
    let session = session_with(Arc::default());
    session.select_version("3.24.2").await.unwrap();
    session.validate(DEFAULT_SCHEMA, DEFAULT_JSON).unwrap();
    session.select_version("4.1.5").await.unwrap();
    assert!(session.active_schema().is_none());
    let record = session.validate_current().unwrap();
    assert_eq!(record.version, "4.1.5");
}

#[tokio::test]
async fn reset_restores_defaults() {
    let session = session_with(Arc::default());
    session.select_version("3.24.2").await.unwrap();
    session.validate("z.number()", "1").unwrap();
    session.reset();
    let texts = session.texts();
    assert_eq!(texts.schema_text, DEFAULT_SCHEMA);
    assert_eq!(texts.json_text, DEFAULT_JSON);
    assert_eq!(texts.result_text, "");
    assert!(session.last_result().is_none());
}

#[tokio::test]
async fn share_query_round_trips_through_new_session() {
    let session = session_with(Arc::default());
    session.select_version("3.24.2").await.unwrap();
    session.validate("z.number()", "1").unwrap();
    let query = session.share_query();
    assert!(query.contains("version=3.24.2"));

    let restored = session_with(Arc::default());
    let version = restored.apply_query(&query);
    assert_eq!(version.as_deref(), Some("3.24.2"));
    assert_eq!(restored.texts(), session.texts());
}

#[tokio::test]
async fn edited_texts_are_validated_and_shared() {
    let session = session_with(Arc::default());
    session.select_version("3.24.2").await.unwrap();
    session.set_schema_text("z.array(z.number())");
    session.set_json_text("[1, \"two\"]");

    let record = session.validate_current().unwrap();
    assert!(record.result.is_error());
    assert_eq!(session.texts().schema_text, "z.array(z.number())");

    let restored = session_with(Arc::default());
    restored.apply_query(&session.share_query());
    assert_eq!(restored.texts().json_text, "[1, \"two\"]");
}

#[tokio::test]
async fn declarations_need_a_current_module() {
    let session = session_with(Arc::default());
    assert!(matches!(
        session.declarations().await,
        Err(SessionError::NotReady)
    ));
    session.select_version("3.24.2").await.unwrap();
    assert_eq!(
        session.declarations().await.unwrap(),
        "// 3.24.2 lib/types.d.ts"
    );
}

#[tokio::test]
async fn default_selection_follows_latest_tag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/packages/npm/zod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tags": {"latest": "3.23.8"},
            "versions": [
                {"version": "3.23.8", "links": {"self": "", "entrypoints": "", "stats": ""}}
            ]
        })))
        .mount(&server)
        .await;
    let resolver =
        VersionResolver::new(RegistrySettings::with_registry_url(server.uri())).unwrap();
    let session = Session::new(resolver, VersionLoader::with_source(Arc::new(GatedSource::default())));

    let selection = session.select_default().await.unwrap();
    assert_eq!(selection.module().version(), "3.23.8");
}

#[tokio::test]
async fn default_selection_falls_back_offline() {
    let session = session_with(Arc::default());
    let selection = session.select_default().await.unwrap();
    assert_eq!(selection.module().version(), FALLBACK_VERSION);
}
