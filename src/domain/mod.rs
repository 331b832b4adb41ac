//! Domain layer - Core business logic and models.
//!
//! Pure ledger types and arithmetic: money flooring, accounts, transactions,
//! multi-leg operations, payouts and the club-payment calendar.
//! No I/O here (hexagonal architecture inner ring).
//! All types are serializable and testable in isolation.

pub mod account;
pub mod club;
pub mod error;
pub mod money;
pub mod operation;
pub mod payout;
pub mod transaction;

// Re-export core types for convenience
pub use account::{Account, AccountId, AccountProfile, BalanceKind, ClubSettings, NewAccount, Provider};
pub use error::{Entity, LedgerError, LedgerResult};
pub use operation::{
    Category, Leg, LegRequest, Operation, OperationId, OperationStatus, Outcome,
    PlaceOperationRequest, ResolveRequest, Stake, StakeRequest,
};
pub use payout::{OperationQuote, potential_return, quote_operation};
pub use transaction::{Transaction, TransactionDetail, TransactionId, TransactionKind};
