//! State Store - Atomic JSON Ledger Snapshots
//!
//! Saves the full ledger to `state.json` using atomic writes
//! (write to tmp file, then rename), so the file on disk is always
//! either the previous or the new snapshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::ports::repository::LedgerSnapshot;

/// Atomic JSON store for the ledger snapshot.
pub struct StateStore {
    state_path: PathBuf,
    tmp_path: PathBuf,
}

impl StateStore {
    /// Create a state store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

        Ok(Self {
            state_path: dir.join("state.json"),
            tmp_path: dir.join("state.json.tmp"),
        })
    }

    /// Save a snapshot atomically (tmp → rename).
    #[instrument(skip(self, state), fields(transactions = state.transactions.len()))]
    pub async fn save(&self, state: &LedgerSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("Failed to serialize ledger")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp state file")?;

        fs::rename(&self.tmp_path, &self.state_path)
            .await
            .context("Failed to rename state file")?;

        debug!(
            path = %self.state_path.display(),
            saved_at = %state.saved_at,
            "Ledger snapshot saved"
        );

        Ok(())
    }

    /// Load the snapshot, or `None` on first startup.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !fs::try_exists(&self.state_path).await.unwrap_or(false) {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.state_path)
            .await
            .context("Failed to read state file")?;

        let state: LedgerSnapshot =
            serde_json::from_str(&json).context("Failed to parse state JSON")?;

        info!(
            version = %state.version,
            accounts = state.accounts.len(),
            operations = state.operations.len(),
            "Ledger snapshot loaded"
        );

        Ok(Some(state))
    }

    /// The directory must accept writes; a missing state file is fine.
    pub async fn is_healthy(&self) -> bool {
        let Some(dir) = self.state_path.parent() else {
            return false;
        };
        let probe = dir.join(".health_check");
        let result = fs::write(&probe, b"ok").await;
        let _ = fs::remove_file(&probe).await;
        result.is_ok()
    }
}
