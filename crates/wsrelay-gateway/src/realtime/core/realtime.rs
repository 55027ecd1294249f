use std::sync::Arc;

use tokio::time::Duration;

use super::presence::PresenceTracker;
use super::registry::ConnectionRegistry;
use super::relay::RelayDispatcher;
use crate::obs::GatewayMetrics;
use crate::upstream::{IdentityVerifier, StatusNotifier};

/// Per-session transport knobs.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    pub ping_every: Duration,
    pub idle_timeout: Duration,
    pub outbound_queue: usize,
}

/// RealtimeCore: registry, presence transitions, and the relay fan-out,
/// plus the identity verifier sessions authenticate against.
pub struct RealtimeCore {
    registry: Arc<ConnectionRegistry>,
    presence: Arc<PresenceTracker>,
    relay: RelayDispatcher,
    verifier: Arc<dyn IdentityVerifier>,
    metrics: Arc<GatewayMetrics>,
    limits: SessionLimits,
}

impl RealtimeCore {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn StatusNotifier>,
        service_secret: impl Into<String>,
        send_timeout: Duration,
        limits: SessionLimits,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let presence = Arc::new(PresenceTracker::new(
            Arc::clone(&registry),
            notifier,
            Arc::clone(&metrics),
        ));
        let relay = RelayDispatcher::new(
            Arc::clone(&presence),
            service_secret,
            send_timeout,
            Arc::clone(&metrics),
        );
        Self {
            registry,
            presence,
            relay,
            verifier,
            metrics,
            limits,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry { &self.registry }
    pub fn presence(&self) -> &PresenceTracker { &self.presence }
    pub fn relay(&self) -> &RelayDispatcher { &self.relay }
    pub fn verifier(&self) -> &dyn IdentityVerifier { self.verifier.as_ref() }
    pub fn metrics(&self) -> &GatewayMetrics { &self.metrics }
    pub fn limits(&self) -> SessionLimits { self.limits }
}
