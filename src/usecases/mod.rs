//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the ledger's workflows.
//!
//! Use cases:
//! - `Ledger`: Accounts, transactions and operations (in-memory store)
//! - `LedgerService`: Serialized access with snapshot + audit persistence
//! - `reporting`: Monthly summaries, account reports, alert list

pub mod ledger;
pub mod reporting;
pub mod service;
