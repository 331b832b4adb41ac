//! Ledger HTTP Routes
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/accounts` | GET / POST | List (`?includeInactive=`) / open accounts |
//! | `/api/accounts/:id` | PUT / DELETE | Update profile / deactivate |
//! | `/api/accounts/status` | GET | Deposit, code and club-payment alerts |
//! | `/api/accounts/:id/club-payment` | POST | Pay the current club period |
//! | `/api/accounts/:id/freebets` | POST | Credit freebet balance |
//! | `/api/transactions` | GET / POST | History (`?accountId=&limit=`) / cash movement |
//! | `/api/transactions/:id` | DELETE | Reverse one transaction |
//! | `/api/transfers` | POST | Move cash between accounts |
//! | `/api/operations` | GET / POST | List (`?status=`) / place |
//! | `/api/operations/quote` | POST | Potential return, no side effects |
//! | `/api/operations/:id/resolve` | POST | Resolve won or lost |
//! | `/api/summary` | GET | Current month summary |
//! | `/api/report` | GET | Account report + last 12 months |

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use super::types::{
  AccountsQuery, ApiError, FreebetBody, OperationsQuery, PlacedResponse, QuoteBody,
  ReportResponse, ReversalResponse, TransactionsQuery, TransferResponse,
};
use crate::adapters::metrics::MetricsRegistry;
use crate::domain::account::{Account, AccountId, AccountProfile, NewAccount};
use crate::domain::club::AccountStatus;
use crate::domain::operation::{Operation, OperationId, PlaceOperationRequest, ResolveRequest};
use crate::domain::payout::{OperationQuote, quote_operation};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::ports::repository::Repository;
use crate::usecases::ledger::{CashMovement, FreebetGrant, TransferRequest};
use crate::usecases::reporting::{
  MonthlySummary, account_report, account_statuses, monthly_report, monthly_summary,
};
use crate::usecases::service::{LedgerService, ServiceError, ServiceResult};

type ApiResult<T> = Result<T, ApiError>;

/// Request-independent settings used by the handlers.
#[derive(Debug, Clone, Copy)]
pub struct ApiSettings {
  pub low_balance_threshold: Decimal,
  pub history_limit: usize,
}

/// Shared handler state.
pub struct AppState<R: Repository> {
  pub service: Arc<LedgerService<R>>,
  pub metrics: Option<Arc<MetricsRegistry>>,
  pub settings: ApiSettings,
}

impl<R: Repository> Clone for AppState<R> {
  fn clone(&self) -> Self {
    Self {
      service: Arc::clone(&self.service),
      metrics: self.metrics.clone(),
      settings: self.settings,
    }
  }
}

impl<R: Repository> AppState<R> {
  /// Map a service failure to an API error, counting it.
  fn track<T>(&self, result: ServiceResult<T>) -> ApiResult<T> {
    result.map_err(|e| {
      if let Some(metrics) = &self.metrics {
        metrics.record_error(e.kind());
      }
      ApiError::from(e)
    })
  }

  /// Unwrap an extractor result, counting a rejection as a validation error.
  fn accept<T, E: Into<ApiError>>(&self, extracted: Result<T, E>) -> ApiResult<T> {
    extracted.map_err(|rejection| {
      let err: ApiError = rejection.into();
      if let Some(metrics) = &self.metrics {
        metrics.record_error(err.kind);
      }
      err
    })
  }

  fn count_transactions<'a>(&self, transactions: impl IntoIterator<Item = &'a Transaction>) {
    if let Some(metrics) = &self.metrics {
      metrics.record_transactions(transactions);
    }
  }
}

fn today() -> NaiveDate {
  Utc::now().date_naive()
}

/// All ledger routes, bound to `state`.
pub fn router<R: Repository>(state: AppState<R>) -> Router {
  Router::new()
    .route("/api/accounts", get(list_accounts::<R>).post(create_account::<R>))
    .route("/api/accounts/status", get(account_alerts::<R>))
    .route(
      "/api/accounts/:id",
      put(update_account::<R>).delete(deactivate_account::<R>),
    )
    .route("/api/accounts/:id/club-payment", post(pay_club::<R>))
    .route("/api/accounts/:id/freebets", post(credit_freebet::<R>))
    .route(
      "/api/transactions",
      get(list_transactions::<R>).post(record_cash_movement::<R>),
    )
    .route("/api/transactions/:id", delete(reverse_transaction::<R>))
    .route("/api/transfers", post(transfer::<R>))
    .route(
      "/api/operations",
      get(list_operations::<R>).post(place_operation::<R>),
    )
    .route("/api/operations/quote", post(quote::<R>))
    .route("/api/operations/:id/resolve", post(resolve_operation::<R>))
    .route("/api/summary", get(summary::<R>))
    .route("/api/report", get(report::<R>))
    .with_state(state)
}

// ── Accounts ────────────────────────────────

async fn list_accounts<R: Repository>(
  State(state): State<AppState<R>>,
  query: Result<Query<AccountsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Account>>> {
  let Query(query) = state.accept(query)?;
  Ok(Json(state.service.accounts(query.include_inactive).await))
}

async fn create_account<R: Repository>(
  State(state): State<AppState<R>>,
  body: Result<Json<NewAccount>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Account>)> {
  let Json(body) = state.accept(body)?;
  let (account, opening) = state.track(state.service.create_account(body).await)?;
  state.count_transactions(&opening);
  Ok((StatusCode::CREATED, Json(account)))
}

async fn update_account<R: Repository>(
  State(state): State<AppState<R>>,
  path: Result<Path<AccountId>, PathRejection>,
  body: Result<Json<AccountProfile>, JsonRejection>,
) -> ApiResult<Json<Account>> {
  let Path(id) = state.accept(path)?;
  let Json(body) = state.accept(body)?;
  let account = state.track(state.service.update_account(id, body).await)?;
  Ok(Json(account))
}

async fn deactivate_account<R: Repository>(
  State(state): State<AppState<R>>,
  path: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<Json<Account>> {
  let Path(id) = state.accept(path)?;
  let account = state.track(state.service.deactivate_account(id).await)?;
  Ok(Json(account))
}

async fn account_alerts<R: Repository>(
  State(state): State<AppState<R>>,
) -> Json<Vec<AccountStatus>> {
  let threshold = state.settings.low_balance_threshold;
  let statuses = state
    .service
    .read(|ledger| account_statuses(ledger, today(), threshold))
    .await;
  Json(statuses)
}

async fn pay_club<R: Repository>(
  State(state): State<AppState<R>>,
  path: Result<Path<AccountId>, PathRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
  let Path(id) = state.accept(path)?;
  let tx = state.track(state.service.pay_club(id, Utc::now()).await)?;
  state.count_transactions([&tx]);
  Ok((StatusCode::CREATED, Json(tx)))
}

async fn credit_freebet<R: Repository>(
  State(state): State<AppState<R>>,
  path: Result<Path<AccountId>, PathRejection>,
  body: Result<Json<FreebetBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
  let Path(id) = state.accept(path)?;
  let Json(body) = state.accept(body)?;
  let grant = FreebetGrant {
    account_id: id,
    amount: body.amount,
    description: body.description,
  };
  let tx = state.track(state.service.credit_freebet(grant).await)?;
  state.count_transactions([&tx]);
  Ok((StatusCode::CREATED, Json(tx)))
}

// ── Transactions ────────────────────────────

async fn list_transactions<R: Repository>(
  State(state): State<AppState<R>>,
  query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Transaction>>> {
  let Query(query) = state.accept(query)?;
  let limit = query.limit.unwrap_or(state.settings.history_limit);
  let list = state.track(state.service.transactions(query.account_id, Some(limit)).await)?;
  Ok(Json(list))
}

async fn record_cash_movement<R: Repository>(
  State(state): State<AppState<R>>,
  body: Result<Json<CashMovement>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
  let Json(body) = state.accept(body)?;
  let tx = state.track(state.service.record_cash_movement(body).await)?;
  state.count_transactions([&tx]);
  Ok((StatusCode::CREATED, Json(tx)))
}

async fn reverse_transaction<R: Repository>(
  State(state): State<AppState<R>>,
  path: Result<Path<TransactionId>, PathRejection>,
) -> ApiResult<Json<ReversalResponse>> {
  let Path(id) = state.accept(path)?;
  let reversed = state.track(state.service.reverse_transaction(id).await)?;
  Ok(Json(ReversalResponse {
    message: format!("transaction {id} reversed"),
    reversed,
  }))
}

async fn transfer<R: Repository>(
  State(state): State<AppState<R>>,
  body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransferResponse>)> {
  let Json(body) = state.accept(body)?;
  let (debit, credit) = state.track(state.service.transfer(body).await)?;
  state.count_transactions([&debit, &credit]);
  Ok((StatusCode::CREATED, Json(TransferResponse { debit, credit })))
}

// ── Operations ──────────────────────────────

async fn list_operations<R: Repository>(
  State(state): State<AppState<R>>,
  query: Result<Query<OperationsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Operation>>> {
  let Query(query) = state.accept(query)?;
  Ok(Json(state.service.operations(query.status).await))
}

async fn place_operation<R: Repository>(
  State(state): State<AppState<R>>,
  body: Result<Json<PlaceOperationRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PlacedResponse>)> {
  let Json(body) = state.accept(body)?;
  let placement = state.track(state.service.place_operation(body).await)?;
  if let Some(metrics) = &state.metrics {
    metrics.record_placement(placement.operation.category);
  }
  state.count_transactions(&placement.transactions);
  Ok((
    StatusCode::CREATED,
    Json(PlacedResponse {
      operation_id: placement.operation.id,
      operation: placement.operation,
      transactions: placement.transactions,
    }),
  ))
}

async fn quote<R: Repository>(
  State(state): State<AppState<R>>,
  body: Result<Json<QuoteBody>, JsonRejection>,
) -> ApiResult<Json<OperationQuote>> {
  let Json(body) = state.accept(body)?;
  let quote = state.track(quote_operation(&body.legs).map_err(ServiceError::from))?;
  Ok(Json(quote))
}

async fn resolve_operation<R: Repository>(
  State(state): State<AppState<R>>,
  path: Result<Path<OperationId>, PathRejection>,
  body: Result<Json<ResolveRequest>, JsonRejection>,
) -> ApiResult<Json<Operation>> {
  let Path(id) = state.accept(path)?;
  let Json(body) = state.accept(body)?;
  let resolution = state.track(state.service.resolve_operation(id, body).await)?;
  if let Some(metrics) = &state.metrics {
    metrics.record_resolution(resolution.operation.status);
  }
  state.count_transactions(&resolution.payouts);
  Ok(Json(resolution.operation))
}

// ── Reports ─────────────────────────────────

async fn summary<R: Repository>(State(state): State<AppState<R>>) -> Json<MonthlySummary> {
  Json(state.service.read(|ledger| monthly_summary(ledger, today())).await)
}

async fn report<R: Repository>(State(state): State<AppState<R>>) -> Json<ReportResponse> {
  let today = today();
  let report = state
    .service
    .read(|ledger| ReportResponse {
      accounts: account_report(ledger),
      months: monthly_report(ledger, today),
    })
    .await;
  Json(report)
}
