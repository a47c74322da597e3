//! Integration tests for the CDN-backed loader against a mock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zt_loader::{CdnSettings, LoadError, VersionLoader};
use zt_schema::ApiGeneration;

fn loader_for(server: &MockServer) -> VersionLoader {
    VersionLoader::new(CdnSettings::with_cdn_url(server.uri())).unwrap()
}

#[tokio::test]
async fn load_confirms_module_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/+esm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("export {};")
                .set_delay(std::time::Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let (a, b) = tokio::join!(loader.load("3.24.2"), loader.load("3.24.2"));
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.library().id(), b.library().id());
    assert_eq!(a.generation(), ApiGeneration::V3);
    assert!(a.entrypoint().ends_with("/zod@3.24.2/+esm"));

    // Served from cache
    loader.load("3.24.2").await.unwrap();
}

#[tokio::test]
async fn hidden_prerelease_is_loadable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zod@3.22.0-beta.3/+esm"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let module = loader.load("3.22.0-beta.3").await.unwrap();
    assert_eq!(module.version(), "3.22.0-beta.3");
}

#[tokio::test]
async fn missing_version_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zod@3.99.0/+esm"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let err = loader.load("3.99.0").await.unwrap_err();
    assert!(matches!(err, LoadError::Status { status: 404, .. }));
    assert!(!loader.is_cached("3.99.0"));

    // A failed key is retried on the next call
    assert!(loader.load("3.99.0").await.is_err());
}

#[tokio::test]
async fn concurrent_failed_loads_share_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/+esm"))
        .respond_with(ResponseTemplate::new(503).set_delay(std::time::Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let (a, b) = tokio::join!(loader.load("3.24.2"), loader.load("3.24.2"));
    assert!(matches!(a, Err(LoadError::Status { status: 503, .. })));
    assert!(matches!(b, Err(LoadError::Status { status: 503, .. })));
    assert!(!loader.is_cached("3.24.2"));
}

#[tokio::test]
async fn declarations_retry_after_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/lib/types.d.ts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/lib/index.d.ts"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    assert_eq!(loader.load_declarations("3.24.2").await, "");

    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/lib/types.d.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("export declare const z: unknown;"))
        .expect(1)
        .mount(&server)
        .await;
    assert_eq!(
        loader.load_declarations("3.24.2").await,
        "export declare const z: unknown;"
    );
}

#[tokio::test]
async fn unsupported_major_never_hits_the_cdn() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let err = loader.load("2.5.0").await.unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedVersion(_)));
}

#[tokio::test]
async fn declarations_fall_back_to_second_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/lib/types.d.ts"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/zod@3.24.2/lib/index.d.ts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("export * from './types';"))
        .expect(1)
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let text = loader.load_declarations("3.24.2").await;
    assert_eq!(text, "export * from './types';");
    assert_eq!(loader.load_declarations("3.24.2").await, text);
}

#[tokio::test]
async fn declarations_empty_when_cdn_unreachable() {
    let loader = VersionLoader::new(CdnSettings::with_cdn_url("http://127.0.0.1:9")).unwrap();
    assert_eq!(loader.load_declarations("4.0.0").await, "");
}
