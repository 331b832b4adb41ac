//! Repository Implementation - Concrete Adapter for the Repository Port
//!
//! Combines `StateStore` (atomic JSON snapshots) and `AuditLog` (JSONL
//! append-only files) behind the `Repository` trait. The usecases layer
//! only sees the trait, never files or JSON.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use super::audit::AuditLog;
use super::state::StateStore;
use crate::ports::repository::{AuditEntry, LedgerSnapshot, Repository};

/// File-backed repository: `state.json` plus `audit/*.jsonl`.
pub struct RepositoryImpl {
    state_store: StateStore,
    audit_log: AuditLog,
}

impl RepositoryImpl {
    pub fn new(state_store: StateStore, audit_log: AuditLog) -> Self {
        Self {
            state_store,
            audit_log,
        }
    }

    /// Create both stores under `data_dir`, creating directories as needed.
    pub async fn from_data_dir(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let state_store = StateStore::new(data_dir).await?;
        let audit_log = AuditLog::new(data_dir).await?;
        Ok(Self::new(state_store, audit_log))
    }
}

#[async_trait]
impl Repository for RepositoryImpl {
    async fn save_state(&self, state: &LedgerSnapshot) -> Result<()> {
        self.state_store.save(state).await
    }

    async fn load_latest_state(&self) -> Result<Option<LedgerSnapshot>> {
        self.state_store.load().await
    }

    async fn append_audit(&self, entry: &AuditEntry) -> Result<()> {
        self.audit_log.append(entry).await
    }

    async fn load_audit(&self) -> Result<Vec<AuditEntry>> {
        self.audit_log.load_all().await
    }

    async fn is_healthy(&self) -> bool {
        self.state_store.is_healthy().await && self.audit_log.is_healthy().await
    }
}
