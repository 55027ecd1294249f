use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use wsrelay_core::protocol::status::PresenceStatus;

use super::connection::{CloseReason, Connection};
use super::registry::ConnectionRegistry;
use crate::obs::GatewayMetrics;
use crate::upstream::StatusNotifier;

/// Presence transitions: registry mutation paired with the status report.
///
/// Whoever wins the guarded removal of an entry owns its offline report, so
/// a superseded session never marks a healthy reconnect offline. Offline
/// reports are tracked so shutdown can wait for them.
pub struct PresenceTracker {
    registry: Arc<ConnectionRegistry>,
    notifier: Arc<dyn StatusNotifier>,
    metrics: Arc<GatewayMetrics>,
    reports: TaskTracker,
}

impl PresenceTracker {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        notifier: Arc<dyn StatusNotifier>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            registry,
            notifier,
            metrics,
            reports: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Register `conn`, close whatever it superseded, report online.
    pub async fn go_online(&self, conn: &Connection) {
        if let Some(old) = self.registry.register(conn.clone()) {
            if old.close(CloseReason::Superseded) {
                self.metrics.supersessions.inc(&[]);
                info!(identity = %conn.identity(), old_conn = old.id(), "previous connection superseded");
            }
        }
        self.report(conn, PresenceStatus::Online).await;
    }

    /// Deregister on session exit. Reports offline only if this handle was
    /// still the current entry. Returns whether it was.
    pub async fn release(&self, conn: &Connection) -> bool {
        // tracked from before the removal: an empty registry never hides a
        // report that has yet to start
        self.reports
            .track_future(async {
                if !self.registry.unregister_if_current(conn.identity(), conn) {
                    return false;
                }
                self.report_offline(conn).await;
                true
            })
            .await
    }

    /// Evict a handle whose send failed. The offline report runs in the
    /// background so the caller's fan-out is not held up by the upstream.
    pub fn evict_stale(self: &Arc<Self>, conn: &Connection) -> bool {
        let token = self.reports.token();
        let removed = self.registry.unregister_if_current(conn.identity(), conn);
        conn.close(CloseReason::Stale);
        if removed {
            self.metrics.stale_evictions.inc(&[]);
            let this = Arc::clone(self);
            let conn = conn.clone();
            tokio::spawn(async move {
                this.report_offline(&conn).await;
                drop(token);
            });
        }
        removed
    }

    /// Offline reports still in flight.
    pub fn pending_reports(&self) -> usize {
        self.reports.len()
    }

    /// Wait for every offline report started so far to finish.
    pub async fn flush_reports(&self) {
        self.reports.close();
        self.reports.wait().await;
        self.reports.reopen();
    }

    async fn report_offline(&self, conn: &Connection) {
        // a reconnect registered meanwhile owns the identity's status now
        if self.registry.contains(conn.identity()) {
            debug!(identity = %conn.identity(), "identity reconnected, skipping offline report");
            return;
        }
        self.report(conn, PresenceStatus::Offline).await;
    }

    async fn report(&self, conn: &Connection, status: PresenceStatus) {
        if let Err(e) = self
            .notifier
            .notify(conn.identity(), conn.credential(), status)
            .await
        {
            self.metrics.upstream_errors.inc(&[("service", "notifier")]);
            warn!(identity = %conn.identity(), %status, error = %e, "status report failed");
        }
    }
}
