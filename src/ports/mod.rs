//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Repository`: Ledger snapshot + audit log persistence (JSON/JSONL)

pub mod repository;
