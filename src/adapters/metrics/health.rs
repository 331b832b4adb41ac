//! Health Check Server - Liveness, Readiness and Metrics
//!
//! Exposes /live, /ready and /metrics via axum 0.7 for container
//! health checks and scraping. Readiness drops during shutdown and
//! whenever the storage heartbeat fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use tracing::{error, info, instrument};

use super::prometheus::MetricsRegistry;

/// Shared health state polled by readiness probes.
#[derive(Debug)]
pub struct HealthState {
    /// Cleared when shutdown starts.
    pub accepting: AtomicBool,
    /// Last result of the repository health check.
    pub storage_healthy: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    /// Create a new health state (healthy by default).
    pub fn new() -> Self {
        Self {
            accepting: AtomicBool::new(true),
            storage_healthy: AtomicBool::new(true),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.accepting.load(Ordering::Relaxed) && self.storage_healthy.load(Ordering::Relaxed)
    }

    pub fn set_storage_healthy(&self, healthy: bool) {
        self.storage_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn stop_accepting(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }
}

#[derive(Clone)]
struct ProbeState {
    health: Arc<HealthState>,
    metrics: Option<Arc<MetricsRegistry>>,
}

/// Axum-based probe server.
pub struct HealthServer {
    state: Arc<HealthState>,
    metrics: Option<Arc<MetricsRegistry>>,
    port: u16,
}

impl HealthServer {
    /// `metrics` is `None` when metrics are disabled; `/metrics` then 404s.
    pub fn new(state: Arc<HealthState>, metrics: Option<Arc<MetricsRegistry>>, port: u16) -> Self {
        Self {
            state,
            metrics,
            port,
        }
    }

    /// Probe routes, without a listener.
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/live", get(liveness))
            .route("/ready", get(readiness));
        let router = if self.metrics.is_some() {
            router.route("/metrics", get(metrics))
        } else {
            router
        };
        router.with_state(ProbeState {
            health: Arc::clone(&self.state),
            metrics: self.metrics.clone(),
        })
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = self.router();
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

/// Liveness probe: always 200 while the process runs.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness(State(state): State<ProbeState>) -> impl IntoResponse {
    if state.health.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics(State(state): State<ProbeState>) -> impl IntoResponse {
    let Some(registry) = state.metrics else {
        return (StatusCode::NOT_FOUND, String::new());
    };
    match registry.render() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
