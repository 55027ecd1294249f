//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS on `/v1/ws/:identity`
//! - Read the claimed identity from the path and the credential from headers
//! - Hand the split socket to the presence session

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;

use wsrelay_core::error::RelayError;
use wsrelay_core::protocol::auth::{AuthCredential, AUTHORIZATION_HEADER, SESSION_TOKEN_HEADER};

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::transport::session::run_session;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(app): State<AppState>,
    Path(identity): Path<String>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if identity.trim().is_empty() {
        return ApiError(RelayError::BadRequest("identity must not be empty".into())).into_response();
    }
    if app.is_draining() {
        return (StatusCode::SERVICE_UNAVAILABLE, "draining").into_response();
    }

    let credential = AuthCredential::from_headers(
        header_str(&headers, AUTHORIZATION_HEADER),
        header_str(&headers, SESSION_TOKEN_HEADER),
    );
    app.metrics().ws_upgrades.inc(&[]);

    ws.on_upgrade(move |socket| async move {
        let (ws_tx, ws_rx) = socket.split();
        let outcome = run_session(app.realtime(), identity, credential, ws_tx, ws_rx).await;
        tracing::debug!(?outcome, "session finished");
    })
}
