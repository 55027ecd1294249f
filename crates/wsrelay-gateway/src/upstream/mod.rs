//! Upstream collaborators: identity verification and status reporting.
//!
//! Both are consumed through traits so the presence lifecycle does not care
//! whether it talks to the HTTP services or to an in-process fake. Calls are
//! bounded by the client timeout and never retried here.

mod notifier;
mod verifier;

use async_trait::async_trait;
use tokio::time::Duration;

use wsrelay_core::error::{RelayError, Result};
use wsrelay_core::protocol::auth::AuthCredential;
use wsrelay_core::protocol::status::PresenceStatus;

pub use notifier::HttpStatusNotifier;
pub use verifier::HttpIdentityVerifier;

/// Validates a connection's credential for a claimed identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `Ok(())` only on a definitive success.
    async fn verify(&self, identity: &str, credential: &AuthCredential) -> Result<()>;
}

/// Records online/offline transitions in the external system of record.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn notify(
        &self,
        identity: &str,
        credential: &AuthCredential,
        status: PresenceStatus,
    ) -> Result<()>;
}

/// Shared HTTP client for both upstreams, bounded by `timeout`.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RelayError::Internal(format!("http client build failed: {e}")))
}

fn transport_error(service: &str, e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Upstream(format!("{service} timed out"))
    } else {
        RelayError::Upstream(format!("{service} request failed: {e}"))
    }
}
