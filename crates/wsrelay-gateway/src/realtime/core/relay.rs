use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::{Duration, Instant};
use tracing::debug;

use wsrelay_core::error::{RelayError, Result};
use wsrelay_core::protocol::auth::secret_matches;
use wsrelay_core::protocol::broadcast::{BroadcastRequest, BroadcastResult};

use super::presence::PresenceTracker;
use crate::obs::GatewayMetrics;
use crate::realtime::types::PreparedFrame;

enum Delivery {
    Sent,
    Absent,
    Failed,
}

/// Relay dispatcher: fans one trusted message out to the listed identities.
pub struct RelayDispatcher {
    presence: Arc<PresenceTracker>,
    service_secret: String,
    send_timeout: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl RelayDispatcher {
    pub fn new(
        presence: Arc<PresenceTracker>,
        service_secret: impl Into<String>,
        send_timeout: Duration,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            presence,
            service_secret: service_secret.into(),
            send_timeout,
            metrics,
        }
    }

    /// Authenticate the sender, validate the body, deliver.
    pub async fn broadcast(&self, sender_secret: &str, body: &[u8]) -> Result<BroadcastResult> {
        if !secret_matches(&self.service_secret, sender_secret) {
            self.metrics.broadcast_requests.inc(&[("outcome", "auth_failed")]);
            return Err(RelayError::AuthFailed);
        }
        let req = match BroadcastRequest::from_slice(body) {
            Ok(req) => req,
            Err(e) => {
                self.metrics.broadcast_requests.inc(&[("outcome", "bad_request")]);
                return Err(e);
            }
        };
        self.metrics.broadcast_requests.inc(&[("outcome", "ok")]);
        Ok(self.deliver(&req).await)
    }

    /// Deliver to every receiver independently and concurrently.
    ///
    /// A failed send evicts the stale handle; it never aborts the others.
    pub async fn deliver(&self, req: &BroadcastRequest) -> BroadcastResult {
        let started = Instant::now();
        let frame = PreparedFrame::text(req.message_text());
        let presence = &self.presence;
        let wait = self.send_timeout;

        let mut futs = FuturesUnordered::new();
        for identity in &req.receivers {
            let frame = &frame;
            futs.push(async move {
                let Some(conn) = presence.registry().get(identity) else {
                    return Delivery::Absent;
                };
                match conn.send(frame.to_ws_message(), wait).await {
                    Ok(()) => Delivery::Sent,
                    Err(e) => {
                        debug!(identity = %identity, conn = conn.id(), error = %e, "relay send failed, evicting");
                        presence.evict_stale(&conn);
                        Delivery::Failed
                    }
                }
            });
        }

        let (mut sent, mut absent, mut failed) = (0usize, 0u64, 0u64);
        while let Some(d) = futs.next().await {
            match d {
                Delivery::Sent => sent += 1,
                Delivery::Absent => absent += 1,
                Delivery::Failed => failed += 1,
            }
        }

        let m = &self.metrics;
        m.broadcast_recipients.add(&[("outcome", "sent")], sent as u64);
        m.broadcast_recipients.add(&[("outcome", "absent")], absent);
        m.broadcast_recipients.add(&[("outcome", "failed")], failed);
        m.broadcast_duration.observe(&[], started.elapsed());

        BroadcastResult::new(req.receivers.len(), sent, presence.registry().size())
    }
}
