//! Ledger error taxonomy.
//!
//! Every variant describes a caller input problem, not a transient fault,
//! so none of them is retried. Messages are meant to be shown to the user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Account,
    Operation,
    Transaction,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "account"),
            Self::Operation => write!(f, "operation"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Malformed or precondition-violating input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The target exists but its current state forbids the request.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unknown account, operation or transaction id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable label used in API bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidState(_) => "invalid_state",
            Self::NotFound { .. } => "not_found",
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
