//! Audit Log - Append-only JSONL Transaction Trail
//!
//! Every transaction recorded or reversed is appended to a daily file
//! `audit/YYYY-MM-DD.jsonl`, one self-contained JSON entry per line.
//! The log is never replayed; `state.json` stays authoritative.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::ports::repository::AuditEntry;

/// Append-only JSONL audit log with daily file rotation.
pub struct AuditLog {
    audit_dir: PathBuf,
}

impl AuditLog {
    /// Create the audit log under `<data_dir>/audit`.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let audit_dir = data_dir.as_ref().join("audit");
        fs::create_dir_all(&audit_dir)
            .await
            .context("Failed to create audit directory")?;
        Ok(Self { audit_dir })
    }

    /// Append an entry to the file of the day it was logged.
    #[instrument(skip(self, entry), fields(transaction_id = entry.transaction.id))]
    pub async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let date = entry.logged_at.format("%Y-%m-%d").to_string();
        let path = self.audit_dir.join(format!("{date}.jsonl"));

        let mut json = serde_json::to_string(entry).context("Failed to serialize audit entry")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open audit file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write audit entry")?;
        file.flush().await.context("Failed to flush audit file")?;

        Ok(())
    }

    /// Load every entry across all daily files, oldest first.
    ///
    /// Malformed lines are skipped with a warning.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<AuditEntry>> {
        let mut entries = Vec::new();
        let mut files = fs::read_dir(&self.audit_dir)
            .await
            .context("Failed to read audit directory")?;

        while let Some(file) = files.next_entry().await? {
            let path = file.path();
            if path.extension().is_none_or(|ext| ext != "jsonl") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<AuditEntry>(line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => warn!(
                        file = %path.display(),
                        error = %e,
                        "Skipping malformed audit entry"
                    ),
                }
            }
        }

        entries.sort_by_key(|e| (e.logged_at, e.transaction.id));
        info!(count = entries.len(), "Loaded audit entries");
        Ok(entries)
    }

    /// Check that the audit directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let probe = self.audit_dir.join(".health_check");
        let result = fs::write(&probe, b"ok").await;
        let _ = fs::remove_file(&probe).await;
        result.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::domain::transaction::{Transaction, TransactionDetail, TransactionKind};
    use crate::ports::repository::AuditAction;

    fn transaction(id: u64) -> Transaction {
        Transaction {
            id,
            account_id: 1,
            kind: TransactionKind::Deposit,
            amount: dec!(10),
            description: "deposit".to_string(),
            detail: TransactionDetail::Manual,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_entries_rotate_daily_and_load_in_order() {
        let dir = std::env::temp_dir().join(format!("bet-ledger-audit-{}", uuid::Uuid::new_v4()));
        let log = AuditLog::new(&dir).await.unwrap();
        let day1 = Utc.with_ymd_and_hms(2026, 10, 18, 23, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2026, 10, 19, 1, 0, 0).unwrap();

        log.append(&AuditEntry::reversed(transaction(1), day2)).await.unwrap();
        log.append(&AuditEntry::recorded(transaction(1), day1)).await.unwrap();
        fs::write(dir.join("audit").join("2026-10-20.jsonl"), "garbage\n")
            .await
            .unwrap();

        assert!(dir.join("audit").join("2026-10-18.jsonl").exists());
        let entries = log.load_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Recorded);
        assert_eq!(entries[1].action, AuditAction::Reversed);
        let _ = fs::remove_dir_all(&dir).await;
    }
}
