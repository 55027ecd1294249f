//! Lightweight in-process metrics (dependency-free).
//!
//! Counters, gauges and a latency histogram stored as atomics and rendered
//! by the `/metrics` handler in Prometheus text format.

pub mod metrics;

pub use metrics::GatewayMetrics;
