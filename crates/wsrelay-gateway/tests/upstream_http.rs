//! HTTP upstream clients against a local stub server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use tokio::time::{sleep, Duration};

use wsrelay_core::protocol::auth::AuthCredential;
use wsrelay_core::protocol::status::PresenceStatus;
use wsrelay_gateway::upstream::{
    build_client, HttpIdentityVerifier, HttpStatusNotifier, IdentityVerifier, StatusNotifier,
};

#[derive(Debug, Clone)]
struct Seen {
    authorization: Option<String>,
    session_token: Option<String>,
    form: HashMap<String, String>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn record(log: &Log, headers: &HeaderMap, form: HashMap<String, String>) {
    let h = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    log.lock().unwrap().push(Seen {
        authorization: h("authorization"),
        session_token: h("x-session-token"),
        form,
    });
}

async fn verify(
    State(log): State<Log>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let ok = form.get("user_id").map(String::as_str) == Some("u1");
    record(&log, &headers, form);
    Json(json!({ "status": if ok { "success" } else { "failed" } }))
}

async fn status(
    State(log): State<Log>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    record(&log, &headers, form);
    Json(json!({ "status": "success" }))
}

async fn status_rejects() -> impl IntoResponse {
    Json(json!({ "status": "failed" }))
}

async fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn server_error() -> impl IntoResponse {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn forbidden() -> impl IntoResponse {
    StatusCode::FORBIDDEN
}

async fn not_json() -> impl IntoResponse {
    "ok"
}

async fn slow() -> impl IntoResponse {
    sleep(Duration::from_secs(2)).await;
    Json(json!({ "status": "success" }))
}

async fn stub() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new()
        .route("/verify", post(verify))
        .route("/status", post(status))
        .route("/status-rejects", post(status_rejects))
        .route("/no-content", post(no_content))
        .route("/error", post(server_error))
        .route("/forbidden", post(forbidden))
        .route("/not-json", post(not_json))
        .route("/slow", post(slow))
        .with_state(Arc::clone(&log));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), log)
}

fn client() -> reqwest::Client {
    build_client(Duration::from_millis(300)).unwrap()
}

fn cred() -> AuthCredential {
    AuthCredential::new("Bearer abc", "sess-1")
}

#[tokio::test]
async fn verifier_sends_credential_and_identity() {
    let (base, log) = stub().await;
    let v = HttpIdentityVerifier::new(client(), format!("{base}/verify"));

    v.verify("u1", &cred()).await.unwrap();

    let seen = log.lock().unwrap()[0].clone();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer abc"));
    assert_eq!(seen.session_token.as_deref(), Some("sess-1"));
    assert_eq!(seen.form.get("user_id").map(String::as_str), Some("u1"));
}

#[tokio::test]
async fn verifier_failure_status_is_auth_failed() {
    let (base, _log) = stub().await;
    let v = HttpIdentityVerifier::new(client(), format!("{base}/verify"));
    let e = v.verify("someone-else", &cred()).await.unwrap_err();
    assert_eq!(e.client_code().as_str(), "AUTH_FAILED");
}

#[tokio::test]
async fn verifier_non_success_replies_are_failures() {
    let (base, _log) = stub().await;

    let e = HttpIdentityVerifier::new(client(), format!("{base}/forbidden"))
        .verify("u1", &cred())
        .await
        .unwrap_err();
    assert_eq!(e.client_code().as_str(), "AUTH_FAILED");

    let e = HttpIdentityVerifier::new(client(), format!("{base}/error"))
        .verify("u1", &cred())
        .await
        .unwrap_err();
    assert_eq!(e.client_code().as_str(), "UPSTREAM_UNAVAILABLE");

    let e = HttpIdentityVerifier::new(client(), format!("{base}/not-json"))
        .verify("u1", &cred())
        .await
        .unwrap_err();
    assert_eq!(e.client_code().as_str(), "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn verifier_timeout_is_upstream_unavailable() {
    let (base, _log) = stub().await;
    let v = HttpIdentityVerifier::new(client(), format!("{base}/slow"));
    let e = v.verify("u1", &cred()).await.unwrap_err();
    assert_eq!(e.client_code().as_str(), "UPSTREAM_UNAVAILABLE");
    assert!(e.to_string().contains("timed out"), "{e}");
}

#[tokio::test]
async fn unreachable_upstream_is_unavailable() {
    // bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let v = HttpIdentityVerifier::new(client(), format!("http://{addr}/verify"));
    let e = v.verify("u1", &cred()).await.unwrap_err();
    assert_eq!(e.client_code().as_str(), "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn notifier_sends_service_token_and_status() {
    let (base, log) = stub().await;
    let n = HttpStatusNotifier::new(client(), format!("{base}/status"), "notifier-token");

    n.notify("u1", &cred(), PresenceStatus::Online).await.unwrap();
    n.notify("u1", &cred(), PresenceStatus::Offline).await.unwrap();

    let seen = log.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].authorization.as_deref(), Some("notifier-token"));
    assert_eq!(seen[0].session_token.as_deref(), Some("sess-1"));
    assert_eq!(seen[0].form.get("status").map(String::as_str), Some("online"));
    assert_eq!(seen[0].form.get("user_id").map(String::as_str), Some("u1"));
    assert_eq!(seen[1].form.get("status").map(String::as_str), Some("offline"));
}

#[tokio::test]
async fn notifier_reply_handling() {
    let (base, _log) = stub().await;

    HttpStatusNotifier::new(client(), format!("{base}/no-content"), "t")
        .notify("u1", &cred(), PresenceStatus::Online)
        .await
        .unwrap();

    let e = HttpStatusNotifier::new(client(), format!("{base}/status-rejects"), "t")
        .notify("u1", &cred(), PresenceStatus::Online)
        .await
        .unwrap_err();
    assert_eq!(e.client_code().as_str(), "UPSTREAM_UNAVAILABLE");

    let e = HttpStatusNotifier::new(client(), format!("{base}/error"), "t")
        .notify("u1", &cred(), PresenceStatus::Offline)
        .await
        .unwrap_err();
    assert_eq!(e.client_code().as_str(), "UPSTREAM_UNAVAILABLE");

    let e = HttpStatusNotifier::new(client(), format!("{base}/slow"), "t")
        .notify("u1", &cred(), PresenceStatus::Offline)
        .await
        .unwrap_err();
    assert!(e.to_string().contains("timed out"), "{e}");
}
