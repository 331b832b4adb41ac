//! Metrics and Monitoring Adapters
//!
//! Prometheus counters for ledger activity plus the probe server
//! (/live, /ready, /metrics) via axum 0.7.

pub mod health;
pub mod prometheus;

pub use health::{HealthServer, HealthState};
pub use prometheus::MetricsRegistry;
