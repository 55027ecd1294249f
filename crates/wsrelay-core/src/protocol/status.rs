//! Presence status vocabulary and the upstream reply shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Online/offline transition reported to the status service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

impl PresenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `status` field of an upstream reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum UpstreamStatus {
    Success,
    Failed,
    Unknown(String),
}

impl From<String> for UpstreamStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => UpstreamStatus::Success,
            "failed" | "failure" | "error" => UpstreamStatus::Failed,
            _ => UpstreamStatus::Unknown(s),
        }
    }
}

/// Upstream reply body (identity and status services). Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamReply {
    pub status: UpstreamStatus,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        self.status == UpstreamStatus::Success
    }
}
