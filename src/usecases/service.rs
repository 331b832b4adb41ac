//! Ledger Service - Serialized, Persisted Access to the Ledger
//!
//! Wraps the in-memory `Ledger` with a single async mutex and a
//! `Repository`. Every mutation runs against a working copy:
//! 1. Lock and clone the committed ledger
//! 2. Apply the change (domain validation happens here)
//! 3. Save the full snapshot
//! 4. Append the touched transactions to the audit log
//! 5. Swap the working copy in
//!
//! A rejected request or a failed snapshot write leaves the committed
//! state untouched.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::domain::account::{Account, AccountId, AccountProfile, NewAccount};
use crate::domain::error::LedgerError;
use crate::domain::operation::{
  Operation, OperationId, OperationStatus, PlaceOperationRequest, ResolveRequest,
};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::ports::repository::{AuditEntry, Repository};
use crate::usecases::ledger::{
  CashMovement, FreebetGrant, Ledger, LedgerPolicy, Placement, Resolution, TransferRequest,
};

/// Failure of a service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
  /// The ledger rejected the request.
  #[error(transparent)]
  Ledger(#[from] LedgerError),
  /// The change was valid but could not be persisted.
  #[error("persistence failure: {0:#}")]
  Persistence(anyhow::Error),
}

impl ServiceError {
  /// Stable error kind used in API bodies and metrics labels.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Ledger(e) => e.kind(),
      Self::Persistence(_) => "internal",
    }
  }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Persisted ledger shared by all request handlers.
pub struct LedgerService<R: Repository> {
  ledger: Mutex<Ledger>,
  repo: Arc<R>,
}

impl<R: Repository> LedgerService<R> {
  /// Start from an already built ledger (tests, fresh installs).
  pub fn new(ledger: Ledger, repo: Arc<R>) -> Self {
    Self {
      ledger: Mutex::new(ledger),
      repo,
    }
  }

  /// Load the latest snapshot, or start empty if there is none.
  ///
  /// Balances that disagree with their history are logged, not repaired.
  #[instrument(skip(repo))]
  pub async fn load(repo: Arc<R>, policy: LedgerPolicy) -> anyhow::Result<Self> {
    let ledger = match repo
      .load_latest_state()
      .await
      .context("Failed to load ledger snapshot")?
    {
      Some(snapshot) => {
        let saved_at = snapshot.saved_at;
        let ledger = Ledger::restore(snapshot, policy).context("Ledger snapshot is invalid")?;
        info!(
          %saved_at,
          accounts = ledger.accounts(true).len(),
          transactions = ledger.history().len(),
          "Ledger restored from snapshot"
        );
        ledger
      }
      None => {
        info!("No ledger snapshot found, starting empty");
        Ledger::new(policy)
      }
    };

    for drift in ledger.reconcile() {
      warn!(
        account_id = drift.account_id,
        balance = ?drift.balance,
        recorded = %drift.recorded,
        expected = %drift.expected,
        "Balance does not match transaction history"
      );
    }

    Ok(Self::new(ledger, repo))
  }

  /// Whether the backing store is usable.
  pub async fn storage_healthy(&self) -> bool {
    self.repo.is_healthy().await
  }

  /// Run a read-only query against the committed ledger.
  pub async fn read<T>(&self, query: impl FnOnce(&Ledger) -> T) -> T {
    let ledger = self.ledger.lock().await;
    query(&ledger)
  }

  // ── Accounts ────────────────────────────────

  /// Open an account; also returns its opening-balance transactions.
  pub async fn create_account(&self, request: NewAccount) -> ServiceResult<(Account, Vec<Transaction>)> {
    let (account, opening) = self
      .commit("create_account", |ledger| {
        let mark = ledger.next_transaction_id();
        let account = ledger.create_account(request, Utc::now())?;
        Ok((account, ledger.transactions_since(mark)))
      })
      .await?;
    info!(account_id = account.id, name = %account.name, "Account created");
    Ok((account, opening))
  }

  pub async fn update_account(&self, id: AccountId, profile: AccountProfile) -> ServiceResult<Account> {
    self
      .commit("update_account", |ledger| ledger.update_account(id, profile))
      .await
  }

  pub async fn deactivate_account(&self, id: AccountId) -> ServiceResult<Account> {
    let account = self
      .commit("deactivate_account", |ledger| ledger.deactivate_account(id))
      .await?;
    info!(account_id = id, "Account deactivated");
    Ok(account)
  }

  pub async fn account(&self, id: AccountId) -> ServiceResult<Account> {
    Ok(self.read(|ledger| ledger.account(id).cloned()).await?)
  }

  pub async fn accounts(&self, include_inactive: bool) -> Vec<Account> {
    self
      .read(|ledger| ledger.accounts(include_inactive).into_iter().cloned().collect())
      .await
  }

  // ── Money movements ─────────────────────────

  pub async fn record_cash_movement(&self, movement: CashMovement) -> ServiceResult<Transaction> {
    self
      .commit("record_cash_movement", |ledger| {
        ledger.record_cash_movement(movement, Utc::now())
      })
      .await
  }

  pub async fn credit_freebet(&self, grant: FreebetGrant) -> ServiceResult<Transaction> {
    self
      .commit("credit_freebet", |ledger| ledger.credit_freebet(grant, Utc::now()))
      .await
  }

  pub async fn transfer(&self, request: TransferRequest) -> ServiceResult<(Transaction, Transaction)> {
    self
      .commit("transfer", |ledger| ledger.transfer(request, Utc::now()))
      .await
  }

  /// Pay the club fee for the period containing `at`.
  pub async fn pay_club(&self, account_id: AccountId, at: DateTime<Utc>) -> ServiceResult<Transaction> {
    let tx = self
      .commit("pay_club", |ledger| ledger.pay_club(account_id, at))
      .await?;
    info!(account_id, amount = %tx.amount, "Club fee paid");
    Ok(tx)
  }

  // ── Operations ──────────────────────────────

  #[instrument(skip(self, request), fields(game = %request.game_name, legs = request.legs.len()))]
  pub async fn place_operation(&self, request: PlaceOperationRequest) -> ServiceResult<Placement> {
    let placement = self
      .commit("place_operation", |ledger| ledger.place_operation(request, Utc::now()))
      .await?;
    info!(
      operation_id = %placement.operation.id,
      category = %placement.operation.category,
      stakes = placement.transactions.len(),
      "Operation placed"
    );
    Ok(placement)
  }

  #[instrument(skip(self, request))]
  pub async fn resolve_operation(
    &self,
    id: OperationId,
    request: ResolveRequest,
  ) -> ServiceResult<Resolution> {
    let resolution = self
      .commit("resolve_operation", |ledger| {
        ledger.resolve_operation(id, &request, Utc::now())
      })
      .await?;
    info!(
      operation_id = %id,
      status = %resolution.operation.status,
      payouts = resolution.payouts.len(),
      "Operation resolved"
    );
    Ok(resolution)
  }

  pub async fn operation(&self, id: OperationId) -> ServiceResult<Operation> {
    Ok(self.read(|ledger| ledger.operation(id).cloned()).await?)
  }

  pub async fn operations(&self, status: Option<OperationStatus>) -> Vec<Operation> {
    self
      .read(|ledger| ledger.operations(status).into_iter().cloned().collect())
      .await
  }

  // ── History ─────────────────────────────────

  #[instrument(skip(self))]
  pub async fn reverse_transaction(&self, id: TransactionId) -> ServiceResult<Transaction> {
    let tx = self
      .commit_audited(
        "reverse_transaction",
        |ledger| ledger.reverse_transaction(id),
        |tx: &Transaction| vec![tx.clone()],
      )
      .await?;
    info!(
      transaction_id = id,
      account_id = tx.account_id,
      amount = %tx.amount,
      "Transaction reversed"
    );
    Ok(tx)
  }

  pub async fn transactions(
    &self,
    account_id: Option<AccountId>,
    limit: Option<usize>,
  ) -> ServiceResult<Vec<Transaction>> {
    Ok(
      self
        .read(|ledger| {
          ledger
            .transactions(account_id, limit)
            .map(|list| list.into_iter().cloned().collect::<Vec<_>>())
        })
        .await?,
    )
  }

  // ── Commit pipeline ─────────────────────────

  async fn commit<T, F>(&self, action: &'static str, apply: F) -> ServiceResult<T>
  where
    F: FnOnce(&mut Ledger) -> Result<T, LedgerError>,
  {
    self.commit_audited(action, apply, |_| Vec::new()).await
  }

  /// Apply a change to a working copy, persist it, then publish it.
  ///
  /// `reversed` names the records the change removed from history.
  async fn commit_audited<T, F, A>(&self, action: &'static str, apply: F, reversed: A) -> ServiceResult<T>
  where
    F: FnOnce(&mut Ledger) -> Result<T, LedgerError>,
    A: FnOnce(&T) -> Vec<Transaction>,
  {
    let mut committed = self.ledger.lock().await;
    let mark = committed.next_transaction_id();
    let mut working = committed.clone();

    let value = apply(&mut working)?;
    let now = Utc::now();

    if let Err(e) = self.repo.save_state(&working.snapshot(now)).await {
      error!(action, error = %e, "Failed to persist ledger snapshot, change discarded");
      return Err(ServiceError::Persistence(e));
    }

    let entries = working
      .transactions_since(mark)
      .into_iter()
      .map(|tx| AuditEntry::recorded(tx, now))
      .chain(reversed(&value).into_iter().map(|tx| AuditEntry::reversed(tx, now)));
    for entry in entries {
      if let Err(e) = self.repo.append_audit(&entry).await {
        warn!(
          action,
          transaction_id = entry.transaction.id,
          error = %e,
          "Failed to append audit entry"
        );
      }
    }

    *committed = working;
    Ok(value)
  }
}
