//! End-to-end session lifecycle over the real HTTP adapter and file-backed
//! profile storage: token persistence, restore-on-startup, and the atomic
//! rollback when a held token stops resolving.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use app_lib::adapters::http::HttpBackend;
use app_lib::adapters::storage::FileProfileStorage;
use app_lib::state::session::SessionStore;
use app_lib::state::toasts::ToastQueue;
use doclens_core::ports::{ProfileStorage, TOKEN_KEY};

fn harness(server: &MockServer, dir: &std::path::Path) -> (SessionStore, Arc<FileProfileStorage>) {
    let backend = Arc::new(
        HttpBackend::new(format!("{}/api/v1", server.uri()), Duration::from_secs(5)).unwrap(),
    );
    let storage = Arc::new(FileProfileStorage::open(dir).unwrap());
    let session = SessionStore::new(backend, storage.clone(), Arc::new(ToastQueue::new()));
    (session, storage)
}

#[tokio::test]
async fn login_persists_the_token_and_resolves_the_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "email": "a@b.c"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (session, storage) = harness(&server, dir.path());

    assert!(session.login("a@b.c", "pw").await);
    assert!(session.is_authenticated());
    assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn invalidated_token_clears_the_whole_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok-1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (session, storage) = harness(&server, dir.path());

    session.login("a@b.c", "pw").await;

    let snapshot = session.snapshot();
    assert!(snapshot.user.is_none());
    assert!(!snapshot.has_token);
    assert!(!snapshot.loading);
    assert_eq!(storage.get(TOKEN_KEY), None);
}

#[tokio::test]
async fn persisted_token_restores_the_session_on_startup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer persisted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "email": "a@b.c"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    {
        let storage = FileProfileStorage::open(dir.path()).unwrap();
        storage.set(TOKEN_KEY, "persisted").unwrap();
    }

    let (session, _storage) = harness(&server, dir.path());
    // The persisted token makes the store start in the loading state, so
    // protected views suspend instead of redirecting.
    assert!(session.is_loading());
    assert!(!session.is_authenticated());

    session.resolve_user().await;
    assert!(session.is_authenticated());
    assert!(!session.is_loading());
}
