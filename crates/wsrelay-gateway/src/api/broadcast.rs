use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;

use wsrelay_core::protocol::auth::AUTHORIZATION_HEADER;
use wsrelay_core::protocol::broadcast::BroadcastResult;

use super::ApiError;
use crate::app_state::AppState;

/// `POST /v1/broadcast`
///
/// The body is taken as raw bytes so the service secret is checked before
/// any parsing happens.
pub async fn broadcast(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BroadcastResult>, ApiError> {
    let presented = headers
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let result = app.realtime().relay().broadcast(presented, &body).await?;
    tracing::debug!(
        receivers = result.total_receivers,
        sent = result.total_sent,
        failed = result.total_failed,
        "broadcast delivered"
    );
    Ok(Json(result))
}
