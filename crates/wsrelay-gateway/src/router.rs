//! Axum router wiring.
//!
//! - `GET  /v1/ws/:identity` (alias `/ws/:identity`): presence connection
//! - `POST /v1/broadcast` (alias `/send`): trusted relay
//! - `/healthz`, `/readyz`, `/metrics`: ops

use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/ws/:identity", get(transport::ws::ws_upgrade))
        .route("/ws/:identity", get(transport::ws::ws_upgrade))
        .route("/v1/broadcast", post(api::broadcast::broadcast))
        .route("/send", post(api::broadcast::broadcast))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
