//! Shared fixtures: fake upstreams, in-memory sockets, polling helpers.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::ws::Message;
use futures_util::{Sink, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration, Instant};

use wsrelay_core::error::{RelayError, Result};
use wsrelay_core::protocol::auth::AuthCredential;
use wsrelay_core::protocol::status::PresenceStatus;
use wsrelay_gateway::config::{self, GatewayConfig};
use wsrelay_gateway::obs::GatewayMetrics;
use wsrelay_gateway::realtime::{RealtimeCore, SessionLimits};
use wsrelay_gateway::transport::session::{run_session, SessionOutcome};
use wsrelay_gateway::upstream::{IdentityVerifier, StatusNotifier};

pub const SERVICE_SECRET: &str = "svc-secret";
pub const GOOD_TOKEN: &str = "good-token";

/// Accepts any identity whose session token equals `GOOD_TOKEN`.
#[derive(Default)]
pub struct FakeVerifier {
    pub calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, _identity: &str, credential: &AuthCredential) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if credential.session_token() == GOOD_TOKEN {
            Ok(())
        } else {
            Err(RelayError::AuthFailed)
        }
    }
}

/// Records every status report once it completes; optionally slow, or
/// failing them all.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, PresenceStatus)>>,
    pub fail: bool,
    pub delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<(String, PresenceStatus)> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, identity: &str, status: PresenceStatus) -> usize {
        self.events()
            .iter()
            .filter(|(i, s)| i == identity && *s == status)
            .count()
    }
}

#[async_trait]
impl StatusNotifier for RecordingNotifier {
    async fn notify(
        &self,
        identity: &str,
        _credential: &AuthCredential,
        status: PresenceStatus,
    ) -> Result<()> {
        if let Some(d) = self.delay {
            sleep(d).await;
        }
        self.events.lock().unwrap().push((identity.to_string(), status));
        if self.fail {
            Err(RelayError::Upstream("status service down".into()))
        } else {
            Ok(())
        }
    }
}

pub fn limits() -> SessionLimits {
    SessionLimits {
        ping_every: Duration::from_secs(60),
        idle_timeout: Duration::from_secs(600),
        outbound_queue: 8,
    }
}

pub fn core_with(
    verifier: Arc<FakeVerifier>,
    notifier: Arc<RecordingNotifier>,
    limits: SessionLimits,
) -> Arc<RealtimeCore> {
    Arc::new(RealtimeCore::new(
        verifier,
        notifier,
        SERVICE_SECRET,
        Duration::from_millis(200),
        limits,
        Arc::new(GatewayMetrics::default()),
    ))
}

pub struct Fixture {
    pub core: Arc<RealtimeCore>,
    pub verifier: Arc<FakeVerifier>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn fixture() -> Fixture {
    fixture_with(RecordingNotifier::default(), limits())
}

pub fn fixture_with(notifier: RecordingNotifier, limits: SessionLimits) -> Fixture {
    let verifier = Arc::new(FakeVerifier::default());
    let notifier = Arc::new(notifier);
    let core = core_with(Arc::clone(&verifier), Arc::clone(&notifier), limits);
    Fixture {
        core,
        verifier,
        notifier,
    }
}

pub fn credential(token: &str) -> AuthCredential {
    AuthCredential::new("Bearer client", token)
}

pub type ServerTx = Pin<Box<dyn Sink<Message, Error = std::io::Error> + Send>>;
pub type ServerRx = Pin<Box<dyn Stream<Item = std::result::Result<Message, std::io::Error>> + Send>>;

/// Client end of an in-memory socket.
pub struct Client {
    to_server: Option<mpsc::UnboundedSender<Message>>,
    from_server: mpsc::UnboundedReceiver<Message>,
}

impl Client {
    pub fn send(&self, msg: Message) {
        if let Some(tx) = &self.to_server {
            tx.send(msg).unwrap();
        }
    }

    /// Drop the inbound half: the server's stream ends.
    pub fn disconnect(&mut self) {
        self.to_server.take();
    }

    /// Next non-ping frame from the server, or `None` if it went away.
    pub async fn next_frame(&mut self) -> Option<Message> {
        loop {
            let msg = timeout(Duration::from_secs(2), self.from_server.recv())
                .await
                .expect("timed out waiting for a server frame")?;
            if !matches!(msg, Message::Ping(_)) {
                return Some(msg);
            }
        }
    }

    pub async fn expect_text(&mut self) -> String {
        match self.next_frame().await {
            Some(Message::Text(s)) => s,
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    pub async fn expect_close(&mut self) {
        match self.next_frame().await {
            Some(Message::Close(_)) | None => {}
            other => panic!("expected close, got {other:?}"),
        }
    }

    /// True when no frame is pending right now.
    pub fn is_quiet(&mut self) -> bool {
        self.from_server.try_recv().is_err()
    }
}

pub fn socket_pair() -> (ServerTx, ServerRx, Client) {
    let (to_server, server_in) = mpsc::unbounded_channel::<Message>();
    let (server_out, from_server) = mpsc::unbounded_channel::<Message>();

    let tx = futures_util::sink::unfold(server_out, |out, msg: Message| async move {
        out.send(msg)
            .map_err(|_| std::io::Error::other("client gone"))?;
        Ok::<_, std::io::Error>(out)
    });
    let rx = futures_util::stream::unfold(server_in, |mut rx| async move {
        rx.recv().await.map(|m| (Ok::<_, std::io::Error>(m), rx))
    });

    let client = Client {
        to_server: Some(to_server),
        from_server,
    };
    (Box::pin(tx), Box::pin(rx), client)
}

/// Start a session for `identity` presenting `token`.
pub fn connect(
    core: &Arc<RealtimeCore>,
    identity: &str,
    token: &str,
) -> (JoinHandle<SessionOutcome>, Client) {
    let (tx, rx, client) = socket_pair();
    let handle = tokio::spawn(run_session(
        Arc::clone(core),
        identity.to_string(),
        Ok(credential(token)),
        tx,
        rx,
    ));
    (handle, client)
}

pub async fn join(handle: JoinHandle<SessionOutcome>) -> SessionOutcome {
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("session did not finish")
        .expect("session task panicked")
}

pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while !cond() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        sleep(Duration::from_millis(5)).await;
    }
}

/// Full config with both upstreams pointing at `base`.
pub fn config_for(base: &str) -> GatewayConfig {
    let yaml = format!(
        r#"
version: 1
gateway:
  listen: "127.0.0.1:0"
relay:
  service_secret: "{SERVICE_SECRET}"
  send_timeout_ms: 200
upstream:
  verifier_url: "{base}/verify"
  notifier_url: "{base}/status"
  notifier_token: "notifier-token"
  timeout_ms: 500
"#
    );
    config::load_from_str(&yaml).unwrap()
}
