//! Prometheus metrics
//!
//! Service-level gauges and request counters, exported in the Prometheus
//! text format at `GET /metrics`.

mod registry;

pub use registry::Metrics;
