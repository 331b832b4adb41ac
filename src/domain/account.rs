//! Betting-house accounts.
//!
//! An account belongs to one provider (a betting house, or `personal` for
//! the bettor's own bank money) and carries two balances: withdrawable cash
//! and promotional freebets. Balances only ever change through ledger
//! transactions; the profile fields here are plain metadata.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};
use super::money::{ensure_within_max, floor_cents};

/// Lightweight account identifier.
pub type AccountId = u64;

/// Betting houses supported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Bet365,
    Betesporte,
    Betano,
    Sportingbet,
    /// The bettor's own money, outside any house.
    Personal,
}

impl Provider {
    pub fn is_personal(self) -> bool {
        matches!(self, Self::Personal)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bet365 => write!(f, "bet365"),
            Self::Betesporte => write!(f, "betesporte"),
            Self::Betano => write!(f, "betano"),
            Self::Sportingbet => write!(f, "sportingbet"),
            Self::Personal => write!(f, "personal"),
        }
    }
}

/// Which of the two account balances a movement touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceKind {
    Cash,
    Freebet,
}

/// Recurring club fee settings of a house account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSettings {
    /// Bankroll target for the account.
    #[serde(default = "default_target")]
    pub target: Decimal,
    /// Volume tracked for the club program.
    #[serde(default)]
    pub club_volume: Decimal,
    /// Day of month the fee is due (1-31).
    #[serde(default)]
    pub payment_day: Option<u32>,
    /// Fee charged each period.
    #[serde(default)]
    pub payment_amount: Option<Decimal>,
    /// Last period paid, formatted `YYYY-MM`.
    #[serde(default)]
    pub last_paid_period: Option<String>,
}

fn default_target() -> Decimal {
    dec!(100)
}

impl Default for ClubSettings {
    fn default() -> Self {
        Self {
            target: default_target(),
            club_volume: Decimal::ZERO,
            payment_day: None,
            payment_amount: None,
            last_paid_period: None,
        }
    }
}

/// Editable metadata of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub name: String,
    pub provider: Provider,
    #[serde(default)]
    pub club: ClubSettings,
    #[serde(default)]
    pub notes: Option<String>,
    /// Date the house last sent a verification code.
    #[serde(default)]
    pub last_code_date: Option<NaiveDate>,
}

impl AccountProfile {
    /// Checks the profile and returns it with monetary fields floored.
    pub fn validated(mut self) -> LedgerResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(LedgerError::validation("account name must not be empty"));
        }
        if let Some(day) = self.club.payment_day {
            if !(1..=31).contains(&day) {
                return Err(LedgerError::validation(format!(
                    "payment day must be between 1 and 31, got {day}"
                )));
            }
        }
        if let Some(amount) = self.club.payment_amount {
            let amount = floor_cents(amount);
            if amount <= Decimal::ZERO {
                return Err(LedgerError::validation("payment amount must be positive"));
            }
            ensure_within_max(amount)?;
            self.club.payment_amount = Some(amount);
        }
        if self.club.target < Decimal::ZERO || self.club.club_volume < Decimal::ZERO {
            return Err(LedgerError::validation(
                "target and club volume must not be negative",
            ));
        }
        self.club.target = floor_cents(self.club.target);
        self.club.club_volume = floor_cents(self.club.club_volume);
        Ok(self)
    }
}

/// Request to open a new account, with optional opening balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(flatten)]
    pub profile: AccountProfile,
    #[serde(default)]
    pub cash_balance: Decimal,
    #[serde(default)]
    pub freebet_balance: Decimal,
}

/// A tracked betting-house (or personal) account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub provider: Provider,
    pub cash_balance: Decimal,
    pub freebet_balance: Decimal,
    /// Inactive accounts stay in history but are hidden from selection.
    pub active: bool,
    pub club: ClubSettings,
    pub notes: Option<String>,
    pub last_code_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Opens an account with zero balances from a validated profile.
    pub fn open(id: AccountId, profile: AccountProfile, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: profile.name,
            provider: profile.provider,
            cash_balance: Decimal::ZERO,
            freebet_balance: Decimal::ZERO,
            active: true,
            club: profile.club,
            notes: profile.notes,
            last_code_date: profile.last_code_date,
            created_at,
        }
    }

    /// Replaces the profile fields, leaving balances and status alone.
    pub fn apply_profile(&mut self, profile: AccountProfile) {
        self.name = profile.name;
        self.provider = profile.provider;
        self.club = profile.club;
        self.notes = profile.notes;
        self.last_code_date = profile.last_code_date;
    }

    pub fn balance(&self, kind: BalanceKind) -> Decimal {
        match kind {
            BalanceKind::Cash => self.cash_balance,
            BalanceKind::Freebet => self.freebet_balance,
        }
    }

    /// Applies a signed delta to one balance.
    pub fn adjust(&mut self, kind: BalanceKind, delta: Decimal) {
        match kind {
            BalanceKind::Cash => self.cash_balance += delta,
            BalanceKind::Freebet => self.freebet_balance += delta,
        }
    }
}
