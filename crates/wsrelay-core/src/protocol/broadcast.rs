//! Broadcast endpoint bodies.
//!
//! The `message` value is kept as `RawValue`: the relay never inspects or
//! re-encodes it, recipients receive exactly the bytes the sender posted.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{RelayError, Result};

/// A trusted caller's demand to deliver one message to a set of identities.
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    /// Recipient identities. Duplicates are delivered (and counted) per entry.
    pub receivers: Vec<String>,
    /// Opaque JSON object.
    pub message: Box<RawValue>,
}

impl BroadcastRequest {
    /// Parse and validate a request body.
    ///
    /// Requires a `receivers` array of strings and a `message` JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let req: BroadcastRequest = serde_json::from_slice(body)
            .map_err(|e| RelayError::BadRequest(format!("invalid broadcast body: {e}")))?;
        if !req.message.get().trim_start().starts_with('{') {
            return Err(RelayError::BadRequest("message must be a JSON object".into()));
        }
        Ok(req)
    }

    /// Raw JSON text of the message, exactly as received.
    pub fn message_text(&self) -> &str {
        self.message.get()
    }
}

/// Delivery tally returned to the broadcast caller.
///
/// Invariant: `total_sent + total_failed == total_receivers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// Registered users at the time the tally was taken (after all attempts).
    pub total_users: usize,
    pub total_receivers: usize,
    pub total_sent: usize,
    pub total_failed: usize,
}

impl BroadcastResult {
    pub fn new(total_receivers: usize, total_sent: usize, total_users: usize) -> Self {
        let total_sent = total_sent.min(total_receivers);
        Self {
            total_users,
            total_receivers,
            total_sent,
            total_failed: total_receivers - total_sent,
        }
    }
}
