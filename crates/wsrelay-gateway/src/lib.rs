//! wsRelay gateway library entry.
//!
//! This crate wires the transport, presence sessions, connection registry,
//! relay dispatcher, and upstream clients into one server. It is consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod transport;
pub mod upstream;
