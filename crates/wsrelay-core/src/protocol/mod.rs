//! Wire contracts.
//!
//! - `broadcast`: request/response bodies of the trusted broadcast endpoint.
//! - `auth`: per-connection credential and the header names carrying it.
//! - `status`: presence status values and the identity service reply shape.
//!
//! Parsers never panic; malformed input is reported as `RelayError`.

pub mod auth;
pub mod broadcast;
pub mod status;
