//! wsRelay core: transport-agnostic wire types and the shared error surface.
//!
//! This crate defines the JSON contracts of the broadcast endpoint, the
//! credential and status vocabulary spoken with the upstream identity and
//! status services, and the error type shared by every wsRelay crate. It
//! carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input surfaces as `RelayError` instead of crashing the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, RelayError};
