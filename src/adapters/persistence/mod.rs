//! Persistence Adapters - JSON/JSONL File Storage
//!
//! Implements the Repository port with an atomic JSON snapshot of the
//! ledger and append-only JSONL audit files.
//! No database dependency, lightweight and crash-recoverable.

pub mod audit;
pub mod repository_impl;
pub mod state;

pub use audit::AuditLog;
pub use repository_impl::RepositoryImpl;
pub use state::StateStore;
