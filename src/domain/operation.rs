//! Multi-leg betting operations.
//!
//! An operation groups the stakes of one wager spread across accounts. Each
//! leg is a candidate outcome with its own odd; stakes on a leg are debited
//! at placement and only the winning leg pays out at resolution.
//!
//! State machine: `Active -> Won` and `Active -> Lost`, both terminal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::error::{LedgerError, LedgerResult};
use super::transaction::TransactionId;

/// Opaque operation identifier, unique per placement.
pub type OperationId = Uuid;

/// Market category of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sports,
    /// Casino games: always a single leg.
    Casino,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sports => write!(f, "sports"),
            Self::Casino => write!(f, "casino"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Active,
    Won,
    Lost,
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
        }
    }
}

// ────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────

/// One stake of a proposed leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeRequest {
    pub account_id: AccountId,
    pub amount: Decimal,
    #[serde(default)]
    pub is_freebet: bool,
}

/// One proposed leg: an odd and the stakes backing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegRequest {
    pub odd: Decimal,
    pub stakes: Vec<StakeRequest>,
}

/// Request to place a new operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOperationRequest {
    pub game_name: String,
    pub category: Category,
    #[serde(default)]
    pub match_id: Option<String>,
    pub legs: Vec<LegRequest>,
}

/// Request to resolve an active operation.
///
/// Exactly one of `winning_leg_index` and `lost` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub winning_leg_index: Option<usize>,
    #[serde(default)]
    pub lost: bool,
}

impl ResolveRequest {
    pub fn winner(leg_index: usize) -> Self {
        Self {
            winning_leg_index: Some(leg_index),
            lost: false,
        }
    }

    pub fn lost() -> Self {
        Self {
            winning_leg_index: None,
            lost: true,
        }
    }

    /// Turns the two request fields into an unambiguous outcome.
    pub fn outcome(&self) -> LedgerResult<Outcome> {
        match (self.winning_leg_index, self.lost) {
            (Some(leg_index), false) => Ok(Outcome::Won { leg_index }),
            (None, true) => Ok(Outcome::Lost),
            (Some(_), true) => Err(LedgerError::validation(
                "ambiguous outcome: both a winning leg and lost were given",
            )),
            (None, false) => Err(LedgerError::validation(
                "missing outcome: give a winning leg or mark the operation lost",
            )),
        }
    }
}

/// Validated resolution outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won { leg_index: usize },
    Lost,
}

// ────────────────────────────────────────────
// Stored operation
// ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stake {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub is_freebet: bool,
    /// Placement record that debited this stake.
    pub transaction_id: TransactionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub odd: Decimal,
    pub stakes: Vec<Stake>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: OperationId,
    pub game_name: String,
    pub category: Category,
    pub match_id: Option<String>,
    pub legs: Vec<Leg>,
    pub status: OperationStatus,
    pub winning_leg: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Operation {
    pub fn is_active(&self) -> bool {
        self.status == OperationStatus::Active
    }

    /// Fails with `InvalidState` once the operation has been resolved.
    pub fn ensure_active(&self) -> LedgerResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(LedgerError::invalid_state(format!(
                "operation {} is already resolved as {}",
                self.id, self.status
            )))
        }
    }

    /// Moves the operation into its terminal state.
    pub fn settle(&mut self, outcome: Outcome, at: DateTime<Utc>) -> LedgerResult<()> {
        self.ensure_active()?;
        match outcome {
            Outcome::Won { leg_index } => {
                if leg_index >= self.legs.len() {
                    return Err(LedgerError::validation(format!(
                        "winning leg {leg_index} out of range, operation has {} legs",
                        self.legs.len()
                    )));
                }
                self.status = OperationStatus::Won;
                self.winning_leg = Some(leg_index);
            }
            Outcome::Lost => self.status = OperationStatus::Lost,
        }
        self.resolved_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn operation() -> Operation {
        Operation {
            id: Uuid::new_v4(),
            game_name: "Derby".to_string(),
            category: Category::Sports,
            match_id: None,
            legs: vec![
                Leg {
                    odd: dec!(2.1),
                    stakes: vec![Stake {
                        account_id: 1,
                        amount: dec!(100),
                        is_freebet: false,
                        transaction_id: 1,
                    }],
                },
                Leg {
                    odd: dec!(2.0),
                    stakes: vec![Stake {
                        account_id: 2,
                        amount: dec!(50),
                        is_freebet: true,
                        transaction_id: 2,
                    }],
                },
            ],
            status: OperationStatus::Active,
            winning_leg: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[test]
    fn test_outcome_requires_exactly_one_field() {
        assert_eq!(ResolveRequest::winner(1).outcome(), Ok(Outcome::Won { leg_index: 1 }));
        assert_eq!(ResolveRequest::lost().outcome(), Ok(Outcome::Lost));
        assert!(ResolveRequest::default().outcome().is_err());
        let both = ResolveRequest {
            winning_leg_index: Some(0),
            lost: true,
        };
        assert!(matches!(both.outcome(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_settle_is_terminal() {
        let mut op = operation();
        op.settle(Outcome::Lost, Utc::now()).unwrap();
        assert_eq!(op.status, OperationStatus::Lost);
        let again = op.settle(Outcome::Won { leg_index: 0 }, Utc::now());
        assert!(matches!(again, Err(LedgerError::InvalidState(_))));
        assert_eq!(op.status, OperationStatus::Lost);
    }

    #[test]
    fn test_settle_rejects_out_of_range_leg() {
        let mut op = operation();
        assert!(op.settle(Outcome::Won { leg_index: 2 }, Utc::now()).is_err());
        assert!(op.is_active());
    }
}
