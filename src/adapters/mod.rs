//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! infrastructure (HTTP, file I/O, Prometheus). Each sub-module groups
//! adapters by concern.
//!
//! Adapter categories:
//! - `api`: JSON HTTP API over the ledger service
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSON state snapshots and JSONL audit log

pub mod api;
pub mod metrics;
pub mod persistence;
