//! Shared application state for wsRelay Gateway.
//!
//! Wires the upstream clients, realtime core and metrics together. Startup
//! errors are explicit (Result instead of panic).

use std::sync::Arc;

use tokio::time::{sleep, timeout, Duration};

use wsrelay_core::error::Result;

use crate::config::GatewayConfig;
use crate::obs::GatewayMetrics;
use crate::realtime::{CloseReason, RealtimeCore, SessionLimits};
use crate::upstream::{self, HttpIdentityVerifier, HttpStatusNotifier, IdentityVerifier, StatusNotifier};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    realtime: Arc<RealtimeCore>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Build application state with the HTTP upstream clients from `cfg`.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let client = upstream::build_client(Duration::from_millis(cfg.upstream.timeout_ms))?;
        let verifier = Arc::new(HttpIdentityVerifier::new(
            client.clone(),
            cfg.upstream.verifier_url.clone(),
        ));
        let notifier = Arc::new(HttpStatusNotifier::new(
            client,
            cfg.upstream.notifier_url.clone(),
            cfg.upstream.notifier_token.clone(),
        ));
        Ok(Self::with_upstreams(cfg, verifier, notifier))
    }

    /// Build application state around caller-supplied upstreams.
    pub fn with_upstreams(
        cfg: GatewayConfig,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        let metrics = Arc::new(GatewayMetrics::default());
        let gw = &cfg.gateway;
        let limits = SessionLimits {
            ping_every: Duration::from_millis(gw.ping_interval_ms),
            idle_timeout: Duration::from_millis(gw.idle_timeout_ms),
            outbound_queue: gw.outbound_queue,
        };
        let realtime = Arc::new(RealtimeCore::new(
            verifier,
            notifier,
            cfg.relay.service_secret.clone(),
            Duration::from_millis(cfg.relay.send_timeout_ms),
            limits,
            Arc::clone(&metrics),
        ));

        Self {
            inner: Arc::new(AppStateInner { cfg, metrics }),
            realtime,
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Enter draining: refuse new sessions and close every live one.
    /// Returns the number of handles signalled.
    pub fn begin_drain(&self) -> usize {
        self.inner.metrics.set_draining();
        self.realtime.registry().close_all(CloseReason::Shutdown)
    }

    /// Drain, then wait up to `grace` for every session to deregister and
    /// for the offline reports that follow to finish. Returns whether all
    /// of it settled in time.
    pub async fn drain(&self, grace: Duration) -> bool {
        let closed = self.begin_drain();
        tracing::info!(closed, "draining");

        let realtime = &self.realtime;
        let settled = timeout(grace, async {
            while realtime.registry().size() > 0 {
                sleep(Duration::from_millis(20)).await;
            }
            realtime.presence().flush_reports().await;
        })
        .await
        .is_ok();

        if !settled {
            tracing::warn!(
                registered = realtime.registry().size(),
                pending_reports = realtime.presence().pending_reports(),
                "drain grace expired"
            );
        }
        settled
    }

    /// Gauges computed at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("wsrelay_registered_users", self.realtime.registry().size() as u64)]
    }
}
