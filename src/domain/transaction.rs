//! Transaction records: the append-only audit trail of every balance change.
//!
//! Each record carries a signed amount and a structured detail payload whose
//! variant must match the transaction kind. Records loaded from storage are
//! checked with [`Transaction::validate`] before use.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::{AccountId, BalanceKind};
use super::error::{LedgerError, LedgerResult};
use super::operation::{Category, OperationId};

/// Lightweight transaction identifier.
pub type TransactionId = u64;

/// Current version of the structured detail records.
pub const DETAIL_VERSION: u16 = 1;

/// Closed set of transaction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Expense,
    Transfer,
    ClubPayment,
    BetPlaced,
    FreebetPlaced,
    BetWon,
    /// Promotional freebet granted by a house.
    FreebetCredit,
}

impl TransactionKind {
    pub const ALL: [Self; 9] = [
        Self::Deposit,
        Self::Withdrawal,
        Self::Expense,
        Self::Transfer,
        Self::ClubPayment,
        Self::BetPlaced,
        Self::FreebetPlaced,
        Self::BetWon,
        Self::FreebetCredit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::ClubPayment => "club_payment",
            Self::BetPlaced => "bet_placed",
            Self::FreebetPlaced => "freebet_placed",
            Self::BetWon => "bet_won",
            Self::FreebetCredit => "freebet_credit",
        }
    }

    /// Balance this kind of movement is applied to.
    pub fn balance_kind(self) -> BalanceKind {
        match self {
            Self::FreebetPlaced | Self::FreebetCredit => BalanceKind::Freebet,
            _ => BalanceKind::Cash,
        }
    }

    /// Kinds that make up betting profit and loss.
    pub fn is_betting_result(self) -> bool {
        matches!(self, Self::BetPlaced | Self::BetWon)
    }

    /// Required sign of the amount: `Some(true)` credit, `Some(false)`
    /// debit, `None` either.
    fn expected_credit(self) -> Option<bool> {
        match self {
            Self::Deposit | Self::BetWon | Self::FreebetCredit => Some(true),
            Self::Withdrawal
            | Self::Expense
            | Self::ClubPayment
            | Self::BetPlaced
            | Self::FreebetPlaced => Some(false),
            Self::Transfer => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detail of a stake placement (`bet_placed` / `freebet_placed`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetDetail {
    pub version: u16,
    pub operation_id: OperationId,
    pub game_name: String,
    pub category: Category,
    pub odd: Decimal,
    pub leg_index: usize,
    pub is_freebet: bool,
}

/// Detail of a winning payout (`bet_won`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinDetail {
    pub version: u16,
    pub operation_id: OperationId,
    pub leg_index: usize,
    /// Placement record of the stake this payout settles.
    pub stake_transaction_id: TransactionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    pub counterparty_account_id: AccountId,
    pub direction: TransferDirection,
}

/// Structured payload attached to every transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionDetail {
    Bet(BetDetail),
    Win(WinDetail),
    Transfer(TransferDetail),
    ClubPayment { period: String },
    Manual,
}

impl TransactionDetail {
    /// Operation this record belongs to, if any.
    pub fn operation_id(&self) -> Option<OperationId> {
        match self {
            Self::Bet(bet) => Some(bet.operation_id),
            Self::Win(win) => Some(win.operation_id),
            _ => None,
        }
    }
}

/// Immutable history entry pairing one balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    /// Signed amount: positive credits, negative debits.
    pub amount: Decimal,
    pub description: String,
    pub detail: TransactionDetail,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn balance_kind(&self) -> BalanceKind {
        self.kind.balance_kind()
    }

    /// Checks sign convention and kind/detail pairing.
    pub fn validate(&self) -> LedgerResult<()> {
        let invalid = |reason: &str| {
            LedgerError::validation(format!("transaction {}: {reason}", self.id))
        };

        if self.amount.is_zero() {
            return Err(invalid("amount must not be zero"));
        }
        if let Some(credit) = self.kind.expected_credit() {
            if credit != self.amount.is_sign_positive() {
                return Err(invalid("amount sign does not match kind"));
            }
        }

        let detail_ok = match (&self.detail, self.kind) {
            (TransactionDetail::Bet(bet), TransactionKind::BetPlaced) => {
                bet.version == DETAIL_VERSION && !bet.is_freebet
            }
            (TransactionDetail::Bet(bet), TransactionKind::FreebetPlaced) => {
                bet.version == DETAIL_VERSION && bet.is_freebet
            }
            (TransactionDetail::Win(win), TransactionKind::BetWon) => {
                win.version == DETAIL_VERSION
            }
            (TransactionDetail::Transfer(transfer), TransactionKind::Transfer) => {
                transfer.counterparty_account_id != self.account_id
                    && match transfer.direction {
                        TransferDirection::In => self.amount.is_sign_positive(),
                        TransferDirection::Out => self.amount.is_sign_negative(),
                    }
            }
            (TransactionDetail::ClubPayment { period }, TransactionKind::ClubPayment) => {
                is_period(period)
            }
            (
                TransactionDetail::Manual,
                TransactionKind::Deposit
                | TransactionKind::Withdrawal
                | TransactionKind::Expense
                | TransactionKind::FreebetCredit,
            ) => true,
            _ => false,
        };

        if detail_ok {
            Ok(())
        } else {
            Err(invalid("detail does not match kind"))
        }
    }
}

/// `YYYY-MM`.
fn is_period(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit())
}
