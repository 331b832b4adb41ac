//! Ledger HTTP API Adapter
//!
//! Thin JSON surface over `LedgerService` via axum 0.7. Handlers only
//! translate HTTP to service calls; every rule lives in the usecases.
//!
//! Sub-modules:
//! - `routes`: Router, shared state and handlers
//! - `types`: Query/body/response types and the error body

pub mod routes;
pub mod types;

use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

pub use routes::{ApiSettings, AppState, router};
pub use types::{ApiError, ErrorBody};

/// Serve the API on `bind_address` until the shutdown signal fires.
#[instrument(skip(app, shutdown_rx))]
pub async fn serve(
  app: Router,
  bind_address: String,
  mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
  let listener = tokio::net::TcpListener::bind(&bind_address).await?;
  info!(address = %bind_address, "Ledger API server started");

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      let _ = shutdown_rx.recv().await;
    })
    .await?;

  Ok(())
}
