//! Ledger API Request/Response Types
//!
//! Query strings, request bodies and response envelopes of the JSON API,
//! plus the error body every failed request returns. All payloads are
//! camelCase; monetary values travel as decimal strings.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::account::AccountId;
use crate::domain::operation::{LegRequest, Operation, OperationId, OperationStatus};
use crate::domain::transaction::Transaction;
use crate::usecases::reporting::{AccountReport, MonthlyReportRow};
use crate::usecases::service::ServiceError;

/// `GET /api/accounts`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsQuery {
  #[serde(default)]
  pub include_inactive: bool,
}

/// `GET /api/transactions`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
  pub account_id: Option<AccountId>,
  /// Falls back to the configured history limit.
  pub limit: Option<usize>,
}

/// `GET /api/operations`
#[derive(Debug, Default, Deserialize)]
pub struct OperationsQuery {
  pub status: Option<OperationStatus>,
}

/// `POST /api/accounts/:id/freebets`
#[derive(Debug, Deserialize)]
pub struct FreebetBody {
  pub amount: Decimal,
  #[serde(default)]
  pub description: String,
}

/// `POST /api/operations/quote`
#[derive(Debug, Deserialize)]
pub struct QuoteBody {
  pub legs: Vec<LegRequest>,
}

/// `201` body of `POST /api/operations`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedResponse {
  pub operation_id: OperationId,
  pub operation: Operation,
  pub transactions: Vec<Transaction>,
}

/// `DELETE /api/transactions/:id` confirmation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReversalResponse {
  pub message: String,
  pub reversed: Transaction,
}

/// `POST /api/transfers` result.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
  pub debit: Transaction,
  pub credit: Transaction,
}

/// `GET /api/report`
#[derive(Debug, Serialize)]
pub struct ReportResponse {
  pub accounts: Vec<AccountReport>,
  pub months: Vec<MonthlyReportRow>,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String,
  pub kind: String,
}

/// An error ready to be turned into an HTTP response.
#[derive(Debug)]
pub struct ApiError {
  pub status: StatusCode,
  pub kind: &'static str,
  pub message: String,
}

impl ApiError {
  pub fn bad_request(message: impl Into<String>) -> Self {
    Self {
      status: StatusCode::BAD_REQUEST,
      kind: "validation",
      message: message.into(),
    }
  }
}

impl From<ServiceError> for ApiError {
  fn from(err: ServiceError) -> Self {
    let status = match err.kind() {
      "validation" => StatusCode::BAD_REQUEST,
      "not_found" => StatusCode::NOT_FOUND,
      "invalid_state" => StatusCode::CONFLICT,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = match &err {
      // Storage details stay in the logs.
      ServiceError::Persistence(_) => "the change could not be saved".to_string(),
      ServiceError::Ledger(e) => e.to_string(),
    };
    Self {
      status,
      kind: err.kind(),
      message,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::bad_request(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    Self::bad_request(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    Self::bad_request(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let body = ErrorBody {
      error: self.message,
      kind: self.kind.to_string(),
    };
    (self.status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::error::{Entity, LedgerError};

  #[test]
  fn test_error_kinds_map_to_status_codes() {
    let cases = [
      (LedgerError::validation("bad"), StatusCode::BAD_REQUEST),
      (LedgerError::invalid_state("done"), StatusCode::CONFLICT),
      (LedgerError::not_found(Entity::Operation, 7), StatusCode::NOT_FOUND),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(ServiceError::from(err)).status, status);
    }

    let err = ApiError::from(ServiceError::Persistence(anyhow::anyhow!("disk full")));
    assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err.kind, "internal");
    assert!(!err.message.contains("disk"));
  }
}
