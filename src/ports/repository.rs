//! Repository Port - Ledger Persistence Interface
//!
//! Defines the trait for persisting the ledger: a full state snapshot
//! (authoritative, rewritten on every commit) plus an append-only audit
//! log of every transaction recorded or reversed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::account::{Account, AccountId};
use crate::domain::operation::Operation;
use crate::domain::transaction::{Transaction, TransactionId};

/// Version of the snapshot format written by this build.
pub const SNAPSHOT_VERSION: &str = "1";

/// Full ledger state for crash recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
  /// Version of the state format.
  pub version: String,
  /// When the snapshot was taken.
  pub saved_at: DateTime<Utc>,
  /// Next account ID to hand out.
  pub next_account_id: AccountId,
  /// Next transaction ID to hand out.
  pub next_transaction_id: TransactionId,
  /// All accounts, active or not.
  pub accounts: Vec<Account>,
  /// Transaction history in append order.
  pub transactions: Vec<Transaction>,
  /// All operations, active or resolved.
  pub operations: Vec<Operation>,
}

/// What happened to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
  Recorded,
  Reversed,
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
  pub action: AuditAction,
  pub logged_at: DateTime<Utc>,
  pub transaction: Transaction,
}

impl AuditEntry {
  pub fn recorded(transaction: Transaction, logged_at: DateTime<Utc>) -> Self {
    Self {
      action: AuditAction::Recorded,
      logged_at,
      transaction,
    }
  }

  pub fn reversed(transaction: Transaction, logged_at: DateTime<Utc>) -> Self {
    Self {
      action: AuditAction::Reversed,
      logged_at,
      transaction,
    }
  }
}

/// Trait for ledger persistence providers.
///
/// The snapshot is the source of truth; the audit log is an append-only
/// JSONL trail for inspection and is never replayed.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
  /// Atomically replace the stored ledger snapshot.
  async fn save_state(&self, state: &LedgerSnapshot) -> anyhow::Result<()>;

  /// Load the most recent ledger snapshot.
  async fn load_latest_state(&self) -> anyhow::Result<Option<LedgerSnapshot>>;

  /// Append an entry to the audit log.
  async fn append_audit(&self, entry: &AuditEntry) -> anyhow::Result<()>;

  /// Load all audit entries, oldest first.
  async fn load_audit(&self) -> anyhow::Result<Vec<AuditEntry>>;

  /// Check if the repository is healthy (disk space, permissions).
  async fn is_healthy(&self) -> bool;
}
