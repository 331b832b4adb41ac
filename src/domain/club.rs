//! Club-payment calendar and account alerts.
//!
//! House accounts in a club owe a fee on a fixed day each month. The period
//! paid is tracked as `YYYY-MM`; everything here is plain date arithmetic
//! against a caller-supplied "today".

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::account::{Account, AccountId, ClubSettings, Provider};

/// Club-payment state of an account for the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Current period already paid.
    #[serde(rename_all = "camelCase")]
    Paid { next_due: NaiveDate },
    /// Due on `due_date`, `days_until` days from today (0 = today).
    #[serde(rename_all = "camelCase")]
    Due { due_date: NaiveDate, days_until: i64 },
    #[serde(rename_all = "camelCase")]
    Overdue { due_date: NaiveDate, days_overdue: i64 },
}

/// Verification-code freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Ok,
    /// A new code will be needed tomorrow.
    ExpiresTomorrow,
    /// A new code is needed now.
    Required,
}

/// Derived indicators shown next to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub account_id: AccountId,
    pub name: String,
    pub provider: Provider,
    pub needs_deposit: bool,
    pub code_status: Option<CodeStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// Billing period (`YYYY-MM`) containing `date`.
pub fn period_of(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// The given day of a month, clamped to the month's last day.
pub fn day_in_month(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day.min(31))
        .rev()
        .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

/// Payment state for the period containing `today`.
///
/// Returns `None` when the account has no payment day configured.
pub fn payment_status(club: &ClubSettings, today: NaiveDate) -> Option<PaymentStatus> {
    let day = club.payment_day?;
    let current = period_of(today);

    if club.last_paid_period.as_deref() == Some(current.as_str()) {
        let (year, month) = next_month(today.year(), today.month());
        let next_due = day_in_month(year, month, day)?;
        return Some(PaymentStatus::Paid { next_due });
    }

    let due_date = day_in_month(today.year(), today.month(), day)?;
    let days = (due_date - today).num_days();
    if days < 0 {
        Some(PaymentStatus::Overdue {
            due_date,
            days_overdue: -days,
        })
    } else {
        Some(PaymentStatus::Due {
            due_date,
            days_until: days,
        })
    }
}

/// Code freshness from the date of the last received code.
pub fn code_status(last_code_date: NaiveDate, today: NaiveDate) -> CodeStatus {
    match (today - last_code_date).num_days() {
        6 => CodeStatus::ExpiresTomorrow,
        d if d >= 7 => CodeStatus::Required,
        _ => CodeStatus::Ok,
    }
}

/// All derived indicators for one account.
pub fn account_status(
    account: &Account,
    today: NaiveDate,
    low_balance_threshold: Decimal,
) -> AccountStatus {
    let house = !account.provider.is_personal();
    AccountStatus {
        account_id: account.id,
        name: account.name.clone(),
        provider: account.provider,
        needs_deposit: house && account.cash_balance < low_balance_threshold,
        code_status: account.last_code_date.map(|d| code_status(d, today)),
        payment_status: if house {
            payment_status(&account.club, today)
        } else {
            None
        },
    }
}
