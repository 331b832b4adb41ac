//! Prometheus Metrics Registry - Ledger Observability
//!
//! Counts operations placed and resolved, transactions recorded by kind
//! and request errors by kind. Rendered in the text exposition format on
//! `/metrics` by the health server.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::operation::{Category, OperationStatus};
use crate::domain::transaction::Transaction;

/// Centralized Prometheus metrics for the ledger.
///
/// All metrics follow the naming convention `bet_ledger_*`.
pub struct MetricsRegistry {
    registry: Registry,
    /// Operations placed, by category.
    pub operations_placed: IntCounterVec,
    /// Operations resolved, by outcome (`won` / `lost`).
    pub operations_resolved: IntCounterVec,
    /// Transactions recorded, by kind.
    pub transactions: IntCounterVec,
    /// Requests rejected, by error kind.
    pub errors: IntCounterVec,
    /// Operations currently awaiting resolution.
    pub active_operations: IntGauge,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let operations_placed = IntCounterVec::new(
            Opts::new("bet_ledger_operations_placed_total", "Total operations placed"),
            &["category"],
        )?;

        let operations_resolved = IntCounterVec::new(
            Opts::new(
                "bet_ledger_operations_resolved_total",
                "Total operations resolved",
            ),
            &["outcome"],
        )?;

        let transactions = IntCounterVec::new(
            Opts::new(
                "bet_ledger_transactions_total",
                "Total ledger transactions recorded",
            ),
            &["kind"],
        )?;

        let errors = IntCounterVec::new(
            Opts::new("bet_ledger_errors_total", "Total rejected requests"),
            &["kind"],
        )?;

        let active_operations = IntGauge::new(
            "bet_ledger_active_operations",
            "Operations awaiting resolution",
        )?;

        registry.register(Box::new(operations_placed.clone()))?;
        registry.register(Box::new(operations_resolved.clone()))?;
        registry.register(Box::new(transactions.clone()))?;
        registry.register(Box::new(errors.clone()))?;
        registry.register(Box::new(active_operations.clone()))?;

        Ok(Self {
            registry,
            operations_placed,
            operations_resolved,
            transactions,
            errors,
            active_operations,
        })
    }

    pub fn record_placement(&self, category: Category) {
        self.operations_placed
            .with_label_values(&[category.to_string().as_str()])
            .inc();
        self.active_operations.inc();
    }

    pub fn record_resolution(&self, status: OperationStatus) {
        self.operations_resolved
            .with_label_values(&[status.to_string().as_str()])
            .inc();
        self.active_operations.dec();
    }

    pub fn record_transactions<'a>(&self, transactions: impl IntoIterator<Item = &'a Transaction>) {
        for tx in transactions {
            self.transactions.with_label_values(&[tx.kind.as_str()]).inc();
        }
    }

    pub fn record_error(&self, kind: &str) {
        self.errors.with_label_values(&[kind]).inc();
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
