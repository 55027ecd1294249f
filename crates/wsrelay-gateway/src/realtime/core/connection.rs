use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use axum::extract::ws::Message;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::time::{timeout, Duration};

use wsrelay_core::protocol::auth::AuthCredential;
use wsrelay_core::RelayError;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

/// Why a handle was closed from outside its owning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A newer connection registered for the same identity.
    Superseded,
    /// A relay send failed; the handle was evicted.
    Stale,
    /// Process shutdown.
    Shutdown,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Superseded => "superseded",
            CloseReason::Stale => "stale",
            CloseReason::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("connection closed")]
    Closed,
    #[error("session gone")]
    SessionGone,
    #[error("outbound queue full")]
    Backpressure,
}

impl From<SendError> for RelayError {
    fn from(e: SendError) -> Self {
        RelayError::Transport(e.to_string())
    }
}

/// Connection handle.
///
/// Cloning is cheap; every clone refers to the same live connection. Frames
/// go through a bounded queue drained by the owning session's writer, which
/// serializes concurrent senders onto the socket.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnInner>,
}

struct ConnInner {
    id: u64,
    identity: Arc<str>,
    credential: AuthCredential,
    tx: mpsc::Sender<Message>,
    close_reason: OnceLock<CloseReason>,
    closed: Notify,
}

impl Connection {
    /// Create a handle plus the outbound receiver for the owning session.
    pub fn new(
        identity: impl Into<Arc<str>>,
        credential: AuthCredential,
        queue: usize,
    ) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let inner = ConnInner {
            id: NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed),
            identity: identity.into(),
            credential,
            tx,
            close_reason: OnceLock::new(),
            closed: Notify::new(),
        };
        (Self { inner: Arc::new(inner) }, rx)
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn identity(&self) -> &str {
        &self.inner.identity
    }

    pub(crate) fn identity_arc(&self) -> Arc<str> {
        Arc::clone(&self.inner.identity)
    }

    pub fn credential(&self) -> &AuthCredential {
        &self.inner.credential
    }

    pub fn is_closed(&self) -> bool {
        self.inner.close_reason.get().is_some()
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.inner.close_reason.get().copied()
    }

    /// Signal closure. Returns `true` only for the first caller.
    pub fn close(&self, reason: CloseReason) -> bool {
        if self.inner.close_reason.set(reason).is_ok() {
            self.inner.closed.notify_waiters();
            true
        } else {
            false
        }
    }

    /// Resolves once `close` has been called (immediately if it already was).
    pub async fn closed(&self) {
        let notified = self.inner.closed.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    /// Enqueue one frame, waiting at most `wait` for queue space.
    pub async fn send(&self, msg: Message, wait: Duration) -> Result<(), SendError> {
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        match timeout(wait, self.inner.tx.send(msg)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(SendError::SessionGone),
            Err(_) => Err(SendError::Backpressure),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("identity", &self.inner.identity)
            .field("close_reason", &self.close_reason())
            .finish()
    }
}
