//! Realtime runtime for wsRelay Gateway.
//!
//! Registry + presence + relay fan-out.

pub mod core;
pub mod types;

pub use core::{
    CloseReason, Connection, ConnectionRegistry, PresenceTracker, RealtimeCore, RelayDispatcher,
    SendError, SessionLimits,
};
pub use types::PreparedFrame;
