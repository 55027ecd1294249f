//! Presence session lifecycle.
//!
//! Verify, register and report online, relay until the socket closes, then
//! deregister and report offline. A rejected credential closes the socket
//! without touching the registry. The session is written against split
//! sink/stream halves so axum sockets and in-memory test sockets drive the
//! same code.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};

use wsrelay_core::error::{ClientCode, Result};
use wsrelay_core::protocol::auth::AuthCredential;

use crate::realtime::{CloseReason, Connection, RealtimeCore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Verification failed; the registry never saw this connection.
    Rejected,
    Ended {
        /// This session removed its own entry and reported offline.
        went_offline: bool,
        /// Set when the handle was closed from outside the session.
        close_reason: Option<CloseReason>,
    },
}

/// Run one connection from handshake to close.
///
/// `credential` is the result of reading the handshake headers; a missing
/// credential rejects without contacting the identity service.
pub async fn run_session<Tx, Rx, E>(
    core: Arc<RealtimeCore>,
    identity: String,
    credential: Result<AuthCredential>,
    ws_tx: Tx,
    ws_rx: Rx,
) -> SessionOutcome
where
    Tx: Sink<Message> + Unpin + Send,
    Rx: Stream<Item = std::result::Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    let span = info_span!("session", identity = %identity, conn = tracing::field::Empty);
    drive(core, identity, credential, ws_tx, ws_rx)
        .instrument(span)
        .await
}

async fn drive<Tx, Rx, E>(
    core: Arc<RealtimeCore>,
    identity: String,
    credential: Result<AuthCredential>,
    mut ws_tx: Tx,
    mut ws_rx: Rx,
) -> SessionOutcome
where
    Tx: Sink<Message> + Unpin + Send,
    Rx: Stream<Item = std::result::Result<Message, E>> + Unpin + Send,
    E: Display + Send,
{
    let metrics = core.metrics();

    // ---- authenticate
    let verified = match credential {
        Ok(credential) => {
            let checked = core.verifier().verify(&identity, &credential).await;
            checked.map(|()| credential)
        }
        Err(e) => Err(e),
    };
    let credential = match verified {
        Ok(c) => c,
        Err(e) => {
            if e.client_code() == ClientCode::Upstream {
                metrics.upstream_errors.inc(&[("service", "verifier")]);
            }
            metrics.auth_results.inc(&[("result", "rejected")]);
            info!(error = %e, "connection rejected");
            let _ = ws_tx.send(Message::Close(None)).await;
            return SessionOutcome::Rejected;
        }
    };
    metrics.auth_results.inc(&[("result", "ok")]);

    // ---- register + online
    let limits = core.limits();
    let (conn, mut out_rx) = Connection::new(identity.as_str(), credential, limits.outbound_queue);
    tracing::Span::current().record("conn", conn.id());
    core.presence().go_online(&conn).await;
    metrics.ws_active_sessions.inc(&[]);

    // ---- relay until close
    let mut ping_tick = interval_at(Instant::now() + limits.ping_every, limits.ping_every);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            biased;

            // forced close (supersession, stale eviction, shutdown)
            _ = conn.closed() => {
                debug!(reason = ?conn.close_reason(), "closed from outside the session");
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }

            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break; };
                if ws_tx.send(m).await.is_err() {
                    break;
                }
            }

            // inbound reader: liveness only, content is ignored
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(msg)) => {
                        last_activity = Instant::now();
                        match msg {
                            Message::Ping(payload) => {
                                let _ = ws_tx.send(Message::Pong(payload)).await;
                            }
                            Message::Close(_) => break,
                            _ => {}
                        }
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "receive failed");
                        break;
                    }
                    None => break,
                }
            }

            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            _ = sleep_until(last_activity + limits.idle_timeout) => {
                info!("idle timeout");
                break;
            }
        }
    }

    // ---- deregister + offline
    metrics.ws_active_sessions.dec(&[]);
    let went_offline = core.presence().release(&conn).await;
    if !went_offline {
        debug!("entry already replaced or evicted, skipping offline report");
    }

    SessionOutcome::Ended {
        went_offline,
        close_reason: conn.close_reason(),
    }
}
