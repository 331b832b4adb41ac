//! Ledger Use Case - Authoritative Account and Operation Store
//!
//! Owns every account, transaction and operation, and applies all balance
//! mutations. Each mutating method validates its whole request before the
//! first write, so a rejected call never leaves a partial change behind.
//!
//! Every balance change is paired with exactly one `Transaction`, which
//! keeps the invariant `sum(history) == balance` per account and balance
//! kind (checked by `reconcile`).
//!
//! Operation flow:
//! 1. `place_operation` debits every stake and records `bet_placed` /
//!    `freebet_placed` entries
//! 2. `resolve_operation` pays the winning leg (`bet_won`) or closes the
//!    operation as lost
//! 3. `reverse_transaction` is the only undo, one record at a time

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::account::{Account, AccountId, AccountProfile, BalanceKind, NewAccount};
use crate::domain::club::period_of;
use crate::domain::error::{Entity, LedgerError, LedgerResult};
use crate::domain::money::{ensure_within_max, floor_cents, positive_amount};
use crate::domain::operation::{
  Category, Leg, Operation, OperationId, OperationStatus, Outcome, PlaceOperationRequest,
  ResolveRequest, Stake,
};
use crate::domain::payout::{ensure_odd_within_max, potential_return};
use crate::domain::transaction::{
  BetDetail, DETAIL_VERSION, Transaction, TransactionDetail, TransactionId, TransactionKind,
  TransferDetail, TransferDirection, WinDetail,
};
use crate::ports::repository::{LedgerSnapshot, SNAPSHOT_VERSION};

/// Balance rules that vary per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerPolicy {
  /// Personal accounts may be debited below zero.
  pub allow_negative_personal: bool,
}

impl Default for LedgerPolicy {
  fn default() -> Self {
    Self {
      allow_negative_personal: true,
    }
  }
}

// ────────────────────────────────────────────
// Commands
// ────────────────────────────────────────────

/// Deposit, withdrawal or expense on one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
  pub account_id: AccountId,
  pub kind: TransactionKind,
  pub amount: Decimal,
  #[serde(default)]
  pub description: String,
}

/// Promotional freebet granted to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreebetGrant {
  pub account_id: AccountId,
  pub amount: Decimal,
  #[serde(default)]
  pub description: String,
}

/// Cash moved between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
  pub from_account_id: AccountId,
  pub to_account_id: AccountId,
  pub amount: Decimal,
  #[serde(default)]
  pub description: String,
}

// ────────────────────────────────────────────
// Results
// ────────────────────────────────────────────

/// Outcome of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
  pub operation: Operation,
  pub transactions: Vec<Transaction>,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
  pub operation: Operation,
  /// `bet_won` records created (empty for a lost operation).
  pub payouts: Vec<Transaction>,
}

/// Both balances of an account at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
  pub cash: Decimal,
  pub freebet: Decimal,
}

/// A balance that no longer matches its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDrift {
  pub account_id: AccountId,
  pub balance: BalanceKind,
  pub recorded: Decimal,
  pub expected: Decimal,
}

/// One stake after validation, before any write.
struct PlannedStake {
  leg_index: usize,
  account_id: AccountId,
  amount: Decimal,
  is_freebet: bool,
}

/// The ledger store. Passed explicitly; there is no global instance.
#[derive(Debug, Clone)]
pub struct Ledger {
  policy: LedgerPolicy,
  accounts: BTreeMap<AccountId, Account>,
  /// Append order, which is also creation order.
  transactions: Vec<Transaction>,
  operations: BTreeMap<OperationId, Operation>,
  next_account_id: AccountId,
  next_transaction_id: TransactionId,
}

impl Default for Ledger {
  fn default() -> Self {
    Self::new(LedgerPolicy::default())
  }
}

impl Ledger {
  /// Create an empty ledger.
  pub fn new(policy: LedgerPolicy) -> Self {
    Self {
      policy,
      accounts: BTreeMap::new(),
      transactions: Vec::new(),
      operations: BTreeMap::new(),
      next_account_id: 1,
      next_transaction_id: 1,
    }
  }

  // ── Accounts ────────────────────────────────

  pub fn account(&self, id: AccountId) -> LedgerResult<&Account> {
    self
      .accounts
      .get(&id)
      .ok_or_else(|| LedgerError::not_found(Entity::Account, id))
  }

  fn active_account(&self, id: AccountId) -> LedgerResult<&Account> {
    let account = self.account(id)?;
    if account.active {
      Ok(account)
    } else {
      Err(LedgerError::validation(format!(
        "account '{}' ({id}) is inactive",
        account.name
      )))
    }
  }

  /// Accounts sorted by name; inactive ones only when asked for.
  pub fn accounts(&self, include_inactive: bool) -> Vec<&Account> {
    let mut list: Vec<&Account> = self
      .accounts
      .values()
      .filter(|a| include_inactive || a.active)
      .collect();
    list.sort_by(|a, b| {
      a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then(a.id.cmp(&b.id))
    });
    list
  }

  /// Open an account. Opening balances are recorded as a `deposit` and a
  /// `freebet_credit` so the history explains them.
  pub fn create_account(&mut self, request: NewAccount, at: DateTime<Utc>) -> LedgerResult<Account> {
    let profile = request.profile.validated()?;
    let cash = floor_cents(request.cash_balance);
    let freebet = floor_cents(request.freebet_balance);
    if cash < Decimal::ZERO || freebet < Decimal::ZERO {
      return Err(LedgerError::validation("opening balances must not be negative"));
    }
    ensure_within_max(cash)?;
    ensure_within_max(freebet)?;

    let id = self.next_account_id;
    self.next_account_id += 1;
    self.accounts.insert(id, Account::open(id, profile, at));

    if cash > Decimal::ZERO {
      self.post(
        id,
        TransactionKind::Deposit,
        cash,
        "Opening balance".to_string(),
        TransactionDetail::Manual,
        at,
      );
    }
    if freebet > Decimal::ZERO {
      self.post(
        id,
        TransactionKind::FreebetCredit,
        freebet,
        "Opening freebet balance".to_string(),
        TransactionDetail::Manual,
        at,
      );
    }

    self.account(id).cloned()
  }

  /// Replace an account's profile. Balances are never touched here.
  ///
  /// A profile without `lastPaidPeriod` keeps the stored one.
  pub fn update_account(&mut self, id: AccountId, profile: AccountProfile) -> LedgerResult<Account> {
    let mut profile = profile.validated()?;
    let account = self
      .accounts
      .get_mut(&id)
      .ok_or_else(|| LedgerError::not_found(Entity::Account, id))?;
    if profile.club.last_paid_period.is_none() {
      profile.club.last_paid_period = account.club.last_paid_period.clone();
    }
    account.apply_profile(profile);
    Ok(account.clone())
  }

  /// Hide an account from selection while keeping its history.
  pub fn deactivate_account(&mut self, id: AccountId) -> LedgerResult<Account> {
    let account = self
      .accounts
      .get_mut(&id)
      .ok_or_else(|| LedgerError::not_found(Entity::Account, id))?;
    account.active = false;
    Ok(account.clone())
  }

  // ── Cash movements ──────────────────────────

  /// Record a deposit (credit), withdrawal or expense (debits).
  pub fn record_cash_movement(
    &mut self,
    movement: CashMovement,
    at: DateTime<Utc>,
  ) -> LedgerResult<Transaction> {
    let amount = positive_amount(movement.amount)?;
    let signed = match movement.kind {
      TransactionKind::Deposit => amount,
      TransactionKind::Withdrawal | TransactionKind::Expense => -amount,
      other => {
        return Err(LedgerError::validation(format!(
          "'{other}' cannot be recorded as a cash movement"
        )));
      }
    };

    let account = self.active_account(movement.account_id)?;
    if signed < Decimal::ZERO {
      self.ensure_can_debit(account, BalanceKind::Cash, amount)?;
    }

    let description = non_empty_or(movement.description, movement.kind.as_str());
    Ok(self.post(
      movement.account_id,
      movement.kind,
      signed,
      description,
      TransactionDetail::Manual,
      at,
    ))
  }

  /// Grant freebet balance to an account.
  pub fn credit_freebet(&mut self, grant: FreebetGrant, at: DateTime<Utc>) -> LedgerResult<Transaction> {
    let amount = positive_amount(grant.amount)?;
    self.active_account(grant.account_id)?;
    let description = non_empty_or(grant.description, "Freebet credit");
    Ok(self.post(
      grant.account_id,
      TransactionKind::FreebetCredit,
      amount,
      description,
      TransactionDetail::Manual,
      at,
    ))
  }

  /// Move cash between two accounts. Returns `(debit, credit)`.
  pub fn transfer(
    &mut self,
    request: TransferRequest,
    at: DateTime<Utc>,
  ) -> LedgerResult<(Transaction, Transaction)> {
    if request.from_account_id == request.to_account_id {
      return Err(LedgerError::validation(
        "source and destination accounts must differ",
      ));
    }
    let amount = positive_amount(request.amount)?;
    let source = self.active_account(request.from_account_id)?;
    self.active_account(request.to_account_id)?;
    self.ensure_can_debit(source, BalanceKind::Cash, amount)?;

    let label = non_empty_or(request.description, "transfer");
    let debit = self.post(
      request.from_account_id,
      TransactionKind::Transfer,
      -amount,
      format!("Transfer to: {label}"),
      TransactionDetail::Transfer(TransferDetail {
        counterparty_account_id: request.to_account_id,
        direction: TransferDirection::Out,
      }),
      at,
    );
    let credit = self.post(
      request.to_account_id,
      TransactionKind::Transfer,
      amount,
      format!("Transfer from: {label}"),
      TransactionDetail::Transfer(TransferDetail {
        counterparty_account_id: request.from_account_id,
        direction: TransferDirection::In,
      }),
      at,
    );
    Ok((debit, credit))
  }

  /// Pay the club fee for the period containing `at`.
  pub fn pay_club(&mut self, account_id: AccountId, at: DateTime<Utc>) -> LedgerResult<Transaction> {
    let account = self.active_account(account_id)?;
    if account.provider.is_personal() {
      return Err(LedgerError::validation("personal accounts have no club fee"));
    }
    let (Some(_), Some(amount)) = (account.club.payment_day, account.club.payment_amount) else {
      return Err(LedgerError::validation(format!(
        "account '{}' has no club payment day and amount configured",
        account.name
      )));
    };

    let period = period_of(at.date_naive());
    if account.club.last_paid_period.as_deref() == Some(period.as_str()) {
      return Err(LedgerError::invalid_state(format!(
        "club fee for {period} is already paid on account '{}'",
        account.name
      )));
    }
    self.ensure_can_debit(account, BalanceKind::Cash, amount)?;

    let tx = self.post(
      account_id,
      TransactionKind::ClubPayment,
      -amount,
      format!("Club payment - period {period}"),
      TransactionDetail::ClubPayment {
        period: period.clone(),
      },
      at,
    );
    if let Some(account) = self.accounts.get_mut(&account_id) {
      account.club.last_paid_period = Some(period);
    }
    Ok(tx)
  }

  // ── Operations ──────────────────────────────

  pub fn operation(&self, id: OperationId) -> LedgerResult<&Operation> {
    self
      .operations
      .get(&id)
      .ok_or_else(|| LedgerError::not_found(Entity::Operation, id))
  }

  /// Operations, newest first, optionally filtered by status.
  pub fn operations(&self, status: Option<OperationStatus>) -> Vec<&Operation> {
    let mut list: Vec<&Operation> = self
      .operations
      .values()
      .filter(|op| status.is_none_or(|s| op.status == s))
      .collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    list
  }

  /// Place a multi-leg operation, debiting every stake.
  ///
  /// Fails without touching any balance if any stake or leg is invalid,
  /// any account is unknown or inactive, or any account cannot cover the
  /// sum of its stakes.
  pub fn place_operation(
    &mut self,
    request: PlaceOperationRequest,
    at: DateTime<Utc>,
  ) -> LedgerResult<Placement> {
    let game_name = request.game_name.trim().to_string();
    if game_name.is_empty() {
      return Err(LedgerError::validation("game name must not be empty"));
    }
    if request.legs.is_empty() {
      return Err(LedgerError::validation("an operation needs at least one leg"));
    }
    if request.category == Category::Casino && request.legs.len() != 1 {
      return Err(LedgerError::validation(
        "casino operations have exactly one leg",
      ));
    }

    let mut planned = Vec::new();
    let mut totals: HashMap<(AccountId, BalanceKind), Decimal> = HashMap::new();

    for (leg_index, leg) in request.legs.iter().enumerate() {
      if leg.odd <= Decimal::ONE {
        return Err(LedgerError::validation(format!(
          "leg {leg_index}: odd must be greater than 1, got {}",
          leg.odd
        )));
      }
      ensure_odd_within_max(leg.odd)?;
      if leg.stakes.is_empty() {
        return Err(LedgerError::validation(format!(
          "leg {leg_index}: at least one stake is required"
        )));
      }
      for stake in &leg.stakes {
        let amount = floor_cents(stake.amount);
        if amount <= Decimal::ZERO {
          return Err(LedgerError::validation(format!(
            "leg {leg_index}: stake amount must be positive, got {}",
            stake.amount
          )));
        }
        ensure_within_max(amount)?;
        self.active_account(stake.account_id)?;
        let kind = if stake.is_freebet {
          BalanceKind::Freebet
        } else {
          BalanceKind::Cash
        };
        *totals.entry((stake.account_id, kind)).or_default() += amount;
        planned.push(PlannedStake {
          leg_index,
          account_id: stake.account_id,
          amount,
          is_freebet: stake.is_freebet,
        });
      }
    }

    for ((account_id, kind), total) in &totals {
      let account = self.account(*account_id)?;
      self.ensure_can_debit(account, *kind, *total)?;
    }

    // Validation complete: from here on nothing can fail.
    let operation_id = Uuid::new_v4();
    let mut legs: Vec<Leg> = request
      .legs
      .iter()
      .map(|leg| Leg {
        odd: leg.odd,
        stakes: Vec::with_capacity(leg.stakes.len()),
      })
      .collect();
    let mut transactions = Vec::with_capacity(planned.len());

    for stake in planned {
      let odd = legs[stake.leg_index].odd;
      let (kind, label) = match (stake.is_freebet, request.category) {
        (true, _) => (TransactionKind::FreebetPlaced, "Freebet"),
        (false, Category::Casino) => (TransactionKind::BetPlaced, "Casino"),
        (false, Category::Sports) => (TransactionKind::BetPlaced, "Bet"),
      };
      let tx = self.post(
        stake.account_id,
        kind,
        -stake.amount,
        format!("{game_name} - {label}"),
        TransactionDetail::Bet(BetDetail {
          version: DETAIL_VERSION,
          operation_id,
          game_name: game_name.clone(),
          category: request.category,
          odd,
          leg_index: stake.leg_index,
          is_freebet: stake.is_freebet,
        }),
        at,
      );
      legs[stake.leg_index].stakes.push(Stake {
        account_id: stake.account_id,
        amount: stake.amount,
        is_freebet: stake.is_freebet,
        transaction_id: tx.id,
      });
      transactions.push(tx);
    }

    let operation = Operation {
      id: operation_id,
      game_name,
      category: request.category,
      match_id: request.match_id.filter(|m| !m.trim().is_empty()),
      legs,
      status: OperationStatus::Active,
      winning_leg: None,
      created_at: at,
      resolved_at: None,
    };
    self.operations.insert(operation_id, operation.clone());

    Ok(Placement {
      operation,
      transactions,
    })
  }

  /// Resolve an active operation as won (one leg) or lost.
  ///
  /// Winning stakes are paid to the cash balance, freebet wins included.
  /// Losing stakes get no further record: they were debited at placement.
  pub fn resolve_operation(
    &mut self,
    id: OperationId,
    request: &ResolveRequest,
    at: DateTime<Utc>,
  ) -> LedgerResult<Resolution> {
    let operation = self.operation(id)?;
    operation.ensure_active()?;
    let outcome = request.outcome()?;

    let mut settled = operation.clone();
    settled.settle(outcome, at)?;

    let mut payouts = Vec::new();
    if let Outcome::Won { leg_index } = outcome {
      if let Some(leg) = settled.legs.get(leg_index) {
        for stake in &leg.stakes {
          let payout = potential_return(leg.odd, stake.amount, stake.is_freebet);
          if payout.is_zero() {
            continue;
          }
          let description = if stake.is_freebet {
            format!("Freebet win - Op {id} (net: {payout:.2})")
          } else {
            format!("Bet win - Op {id}")
          };
          payouts.push(self.post(
            stake.account_id,
            TransactionKind::BetWon,
            payout,
            description,
            TransactionDetail::Win(WinDetail {
              version: DETAIL_VERSION,
              operation_id: id,
              leg_index,
              stake_transaction_id: stake.transaction_id,
            }),
            at,
          ));
        }
      }
    }

    self.operations.insert(id, settled.clone());
    Ok(Resolution {
      operation: settled,
      payouts,
    })
  }

  // ── History ─────────────────────────────────

  /// Undo one transaction: apply the inverse delta and drop the record.
  ///
  /// Operation status and sibling stakes are left as they are.
  pub fn reverse_transaction(&mut self, id: TransactionId) -> LedgerResult<Transaction> {
    let position = self
      .transactions
      .iter()
      .position(|t| t.id == id)
      .ok_or_else(|| LedgerError::not_found(Entity::Transaction, id))?;
    let account_id = self.transactions[position].account_id;
    if !self.accounts.contains_key(&account_id) {
      return Err(LedgerError::not_found(Entity::Account, account_id));
    }

    let tx = self.transactions.remove(position);
    if let Some(account) = self.accounts.get_mut(&account_id) {
      account.adjust(tx.balance_kind(), -tx.amount);
    }
    Ok(tx)
  }

  /// Transactions, most recent first, optionally for one account.
  pub fn transactions(
    &self,
    account_id: Option<AccountId>,
    limit: Option<usize>,
  ) -> LedgerResult<Vec<&Transaction>> {
    if let Some(id) = account_id {
      self.account(id)?;
    }
    let mut list: Vec<&Transaction> = self
      .transactions
      .iter()
      .filter(|t| account_id.is_none_or(|id| t.account_id == id))
      .collect();
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    if let Some(limit) = limit {
      list.truncate(limit);
    }
    Ok(list)
  }

  /// Full history in append order.
  pub fn history(&self) -> &[Transaction] {
    &self.transactions
  }

  /// ID the next recorded transaction will get.
  pub fn next_transaction_id(&self) -> TransactionId {
    self.next_transaction_id
  }

  /// Transactions recorded with an ID at or above `mark`.
  pub fn transactions_since(&self, mark: TransactionId) -> Vec<Transaction> {
    self
      .transactions
      .iter()
      .filter(|t| t.id >= mark)
      .cloned()
      .collect()
  }

  /// Balances of an account rebuilt from history up to `at` (inclusive).
  pub fn balances_at(&self, account_id: AccountId, at: DateTime<Utc>) -> LedgerResult<Balances> {
    self.account(account_id)?;
    let mut balances = Balances {
      cash: Decimal::ZERO,
      freebet: Decimal::ZERO,
    };
    for tx in self
      .transactions
      .iter()
      .filter(|t| t.account_id == account_id && t.created_at <= at)
    {
      match tx.balance_kind() {
        BalanceKind::Cash => balances.cash += tx.amount,
        BalanceKind::Freebet => balances.freebet += tx.amount,
      }
    }
    Ok(balances)
  }

  /// Compare every balance with the sum of its history.
  pub fn reconcile(&self) -> Vec<BalanceDrift> {
    let mut expected: HashMap<(AccountId, BalanceKind), Decimal> = HashMap::new();
    for tx in &self.transactions {
      *expected.entry((tx.account_id, tx.balance_kind())).or_default() += tx.amount;
    }

    let mut drift = Vec::new();
    for account in self.accounts.values() {
      for kind in [BalanceKind::Cash, BalanceKind::Freebet] {
        let sum = expected
          .get(&(account.id, kind))
          .copied()
          .unwrap_or(Decimal::ZERO);
        let recorded = account.balance(kind);
        if recorded != sum {
          drift.push(BalanceDrift {
            account_id: account.id,
            balance: kind,
            recorded,
            expected: sum,
          });
        }
      }
    }
    drift
  }

  // ── Persistence ─────────────────────────────

  /// Capture the whole ledger for persistence.
  pub fn snapshot(&self, saved_at: DateTime<Utc>) -> LedgerSnapshot {
    LedgerSnapshot {
      version: SNAPSHOT_VERSION.to_string(),
      saved_at,
      next_account_id: self.next_account_id,
      next_transaction_id: self.next_transaction_id,
      accounts: self.accounts.values().cloned().collect(),
      transactions: self.transactions.clone(),
      operations: self.operations.values().cloned().collect(),
    }
  }

  /// Rebuild a ledger from a snapshot, validating every record.
  pub fn restore(snapshot: LedgerSnapshot, policy: LedgerPolicy) -> LedgerResult<Self> {
    if snapshot.version != SNAPSHOT_VERSION {
      return Err(LedgerError::validation(format!(
        "unsupported snapshot version '{}'",
        snapshot.version
      )));
    }

    let accounts: BTreeMap<AccountId, Account> =
      snapshot.accounts.into_iter().map(|a| (a.id, a)).collect();

    for tx in &snapshot.transactions {
      tx.validate()?;
      if !accounts.contains_key(&tx.account_id) {
        return Err(LedgerError::validation(format!(
          "transaction {} references unknown account {}",
          tx.id, tx.account_id
        )));
      }
      if tx.id >= snapshot.next_transaction_id {
        return Err(LedgerError::validation(format!(
          "transaction {} is beyond the id counter",
          tx.id
        )));
      }
    }
    if accounts
      .keys()
      .any(|id| *id >= snapshot.next_account_id)
    {
      return Err(LedgerError::validation("account id beyond the id counter"));
    }

    Ok(Self {
      policy,
      accounts,
      transactions: snapshot.transactions,
      operations: snapshot
        .operations
        .into_iter()
        .map(|op| (op.id, op))
        .collect(),
      next_account_id: snapshot.next_account_id,
      next_transaction_id: snapshot.next_transaction_id,
    })
  }

  // ── Internals ───────────────────────────────

  /// Check-then-debit gate. Freebet stakes never exceed the freebet
  /// balance; cash debits never exceed the cash balance, except on
  /// personal accounts when the policy allows it.
  fn ensure_can_debit(&self, account: &Account, kind: BalanceKind, amount: Decimal) -> LedgerResult<()> {
    let available = account.balance(kind);
    let exempt = kind == BalanceKind::Cash
      && account.provider.is_personal()
      && self.policy.allow_negative_personal;
    if exempt || amount <= available {
      return Ok(());
    }
    let label = match kind {
      BalanceKind::Cash => "cash",
      BalanceKind::Freebet => "freebet",
    };
    Err(LedgerError::validation(format!(
      "insufficient {label} balance on '{}': {available:.2} available, {amount:.2} required",
      account.name
    )))
  }

  /// Append a record and apply its delta. Callers validate first.
  fn post(
    &mut self,
    account_id: AccountId,
    kind: TransactionKind,
    amount: Decimal,
    description: String,
    detail: TransactionDetail,
    at: DateTime<Utc>,
  ) -> Transaction {
    let id = self.next_transaction_id;
    self.next_transaction_id += 1;

    let tx = Transaction {
      id,
      account_id,
      kind,
      amount,
      description,
      detail,
      created_at: at,
    };
    debug_assert!(self.accounts.contains_key(&account_id));
    if let Some(account) = self.accounts.get_mut(&account_id) {
      account.adjust(kind.balance_kind(), amount);
    }
    self.transactions.push(tx.clone());
    tx
  }
}

/// Floors an input amount and requires it to stay positive.
fn non_empty_or(value: String, fallback: &str) -> String {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    fallback.to_string()
  } else {
    trimmed.to_string()
  }
}
