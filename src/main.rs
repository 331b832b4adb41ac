//! Bet Ledger - Entry Point
//!
//! Initializes configuration, logging and persistence, then serves the
//! ledger API until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (or `BET_LEDGER_CONFIG`) + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Open the file repository and restore the ledger snapshot
//! 4. Spawn health/metrics server (/live, /ready, /metrics)
//! 5. Spawn storage heartbeat feeding readiness
//! 6. Spawn the ledger API server
//! 7. Wait for SIGINT → graceful shutdown (not ready → drain → exit)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use bet_ledger::adapters::api::{self, ApiSettings, AppState};
use bet_ledger::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use bet_ledger::adapters::persistence::RepositoryImpl;
use bet_ledger::config;
use bet_ledger::domain::operation::OperationStatus;
use bet_ledger::usecases::service::LedgerService;

/// Interval between repository health checks.
const STORAGE_HEARTBEAT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_from_env().context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.persistence.data_dir,
        "Starting bet ledger"
    );

    // ── 3. Repository + ledger restore ──────────────────────
    let repo = Arc::new(
        RepositoryImpl::from_data_dir(&config.persistence.data_dir)
            .await
            .context("Failed to open data directory")?,
    );
    let service = Arc::new(
        LedgerService::load(Arc::clone(&repo), config.ledger.policy())
            .await
            .context("Failed to restore ledger")?,
    );

    let metrics = if config.metrics.enabled {
        let registry = Arc::new(MetricsRegistry::new().context("Failed to register metrics")?);
        let active = service
            .operations(Some(OperationStatus::Active))
            .await
            .len();
        registry
            .active_operations
            .set(i64::try_from(active).unwrap_or(i64::MAX));
        Some(registry)
    } else {
        None
    };

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let health = Arc::new(HealthState::new());

    // ── 4. Health / metrics server ──────────────────────────
    let health_server = HealthServer::new(
        Arc::clone(&health),
        metrics.clone(),
        config.metrics.health_port,
    );
    let health_shutdown = shutdown_tx.subscribe();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run(health_shutdown).await {
            error!(error = %e, "Health server failed");
        }
    });

    // ── 5. Storage heartbeat ────────────────────────────────
    let heartbeat_service = Arc::clone(&service);
    let heartbeat_health = Arc::clone(&health);
    let mut heartbeat_shutdown = shutdown_tx.subscribe();
    let heartbeat_handle = tokio::spawn(async move {
        loop {
            let healthy = heartbeat_service.storage_healthy().await;
            if !healthy {
                warn!("Storage health check failed");
            }
            heartbeat_health.set_storage_healthy(healthy);
            tokio::select! {
                biased;
                _ = heartbeat_shutdown.recv() => break,
                () = tokio::time::sleep(STORAGE_HEARTBEAT) => {}
            }
        }
    });

    // ── 6. Ledger API server ────────────────────────────────
    let app = api::router(AppState {
        service: Arc::clone(&service),
        metrics,
        settings: ApiSettings {
            low_balance_threshold: config.ledger.low_balance_threshold,
            history_limit: config.ledger.history_limit,
        },
    });
    let api_shutdown = shutdown_tx.subscribe();
    let bind_address = config.service.bind_address.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(app, bind_address, api_shutdown).await {
            error!(error = %e, "Ledger API server failed");
        }
    });

    info!("All tasks spawned - ledger is running");

    // ── 7. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for SIGINT, shutting down");
    } else {
        info!("SIGINT received, initiating graceful shutdown");
    }

    // Readiness → 503 before the listeners stop.
    health.stop_accepting();
    let _ = shutdown_tx.send(());

    // In-flight requests finish their commit before the API task ends.
    let _ = tokio::time::timeout(Duration::from_secs(10), api_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(2), heartbeat_handle).await;
    health_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
