//! Realtime core components for Gateway runtime.
//!
//! Connection handles, the identity registry, presence transitions, and the
//! relay fan-out.

mod connection;
mod presence;
mod realtime;
mod registry;
mod relay;

pub use connection::{CloseReason, Connection, SendError};
pub use presence::PresenceTracker;
pub use realtime::{RealtimeCore, SessionLimits};
pub use registry::ConnectionRegistry;
pub use relay::RelayDispatcher;
