//! Reporting Use Case - Read-Only Views over the Ledger
//!
//! Monthly summary, per-account report, 12-month history and the
//! account alert list. Everything is derived from the transaction history
//! at call time; nothing here mutates the ledger.
//!
//! Betting P/L counts `bet_placed` + `bet_won` only. Freebet stakes are
//! promotional balance and stay out of the cash P/L.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::account::{AccountId, Provider};
use crate::domain::club::{AccountStatus, account_status, period_of};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::usecases::ledger::Ledger;

/// Cash flow of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
  pub period: String,
  /// Positive movements outside betting.
  pub credits: Decimal,
  /// Negative movements outside betting, as a positive number.
  pub debits: Decimal,
  /// Betting P/L.
  pub net: Decimal,
}

/// Balances and lifetime betting figures of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountReport {
  pub account_id: AccountId,
  pub name: String,
  pub provider: Provider,
  pub cash_balance: Decimal,
  pub freebet_balance: Decimal,
  pub club_target: Decimal,
  pub club_volume: Decimal,
  pub pl_total: Decimal,
  pub volume_bet: Decimal,
}

/// One row of the 12-month report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReportRow {
  pub period: String,
  pub pl: Decimal,
  pub expenses: Decimal,
  pub club_payments: Decimal,
}

/// Number of months covered by `monthly_report`.
pub const REPORT_MONTHS: u32 = 12;

fn in_period<'a>(ledger: &'a Ledger, period: &'a str) -> impl Iterator<Item = &'a Transaction> {
  ledger
    .history()
    .iter()
    .filter(move |tx| period_of(tx.created_at.date_naive()) == period)
}

/// Summary of the month containing `today`.
pub fn monthly_summary(ledger: &Ledger, today: NaiveDate) -> MonthlySummary {
  let period = period_of(today);
  let mut summary = MonthlySummary {
    period: period.clone(),
    credits: Decimal::ZERO,
    debits: Decimal::ZERO,
    net: Decimal::ZERO,
  };

  for tx in in_period(ledger, &period) {
    if tx.kind.is_betting_result() {
      summary.net += tx.amount;
    } else if tx.amount > Decimal::ZERO {
      summary.credits += tx.amount;
    } else {
      summary.debits += tx.amount.abs();
    }
  }
  summary
}

/// Report for every active account, sorted by name.
pub fn account_report(ledger: &Ledger) -> Vec<AccountReport> {
  ledger
    .accounts(false)
    .into_iter()
    .map(|account| {
      let (pl_total, volume_bet) = ledger
        .history()
        .iter()
        .filter(|tx| tx.account_id == account.id)
        .fold((Decimal::ZERO, Decimal::ZERO), |(pl, volume), tx| match tx.kind {
          TransactionKind::BetPlaced => (pl + tx.amount, volume + tx.amount.abs()),
          TransactionKind::BetWon => (pl + tx.amount, volume),
          _ => (pl, volume),
        });
      AccountReport {
        account_id: account.id,
        name: account.name.clone(),
        provider: account.provider,
        cash_balance: account.cash_balance,
        freebet_balance: account.freebet_balance,
        club_target: account.club.target,
        club_volume: account.club.club_volume,
        pl_total,
        volume_bet,
      }
    })
    .collect()
}

/// The last `REPORT_MONTHS` calendar months up to `today`, oldest first.
pub fn monthly_report(ledger: &Ledger, today: NaiveDate) -> Vec<MonthlyReportRow> {
  let current = today.year() * 12 + today.month0() as i32;
  (0..REPORT_MONTHS as i32)
    .rev()
    .map(|back| {
      let index = current - back;
      let period = format!("{}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1);
      let mut row = MonthlyReportRow {
        period: period.clone(),
        pl: Decimal::ZERO,
        expenses: Decimal::ZERO,
        club_payments: Decimal::ZERO,
      };
      for tx in in_period(ledger, &period) {
        match tx.kind {
          TransactionKind::BetPlaced | TransactionKind::BetWon => row.pl += tx.amount,
          TransactionKind::Expense => row.expenses += tx.amount.abs(),
          TransactionKind::ClubPayment => row.club_payments += tx.amount.abs(),
          _ => {}
        }
      }
      row
    })
    .collect()
}

/// Alert indicators for every active account.
pub fn account_statuses(
  ledger: &Ledger,
  today: NaiveDate,
  low_balance_threshold: Decimal,
) -> Vec<AccountStatus> {
  ledger
    .accounts(false)
    .into_iter()
    .map(|account| account_status(account, today, low_balance_threshold))
    .collect()
}
