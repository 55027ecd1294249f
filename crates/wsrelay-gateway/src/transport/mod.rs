//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler and the presence session it drives.

pub mod session;
pub mod ws;
