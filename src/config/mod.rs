//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml` (path
//! overridable with `BET_LEDGER_CONFIG`). Every section and field has a
//! default, so an absent file or section yields a working setup.

pub mod loader;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::usecases::ledger::LedgerPolicy;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Service identity and HTTP binding.
  pub service: ServiceConfig,
  /// Ledger rules and API defaults.
  pub ledger: LedgerConfig,
  /// Metrics and monitoring.
  pub metrics: MetricsConfig,
  /// Persistence configuration.
  pub persistence: PersistenceConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// API bind address.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

/// Ledger rules.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
  /// House accounts below this cash balance are flagged for a deposit.
  #[serde(default = "default_low_balance_threshold")]
  pub low_balance_threshold: Decimal,
  /// Allow personal accounts to be debited below zero.
  #[serde(default = "default_true")]
  pub allow_negative_personal: bool,
  /// Transactions returned by the history endpoint without `limit`.
  #[serde(default = "default_history_limit")]
  pub history_limit: usize,
}

impl LedgerConfig {
  pub fn policy(&self) -> LedgerPolicy {
    LedgerPolicy {
      allow_negative_personal: self.allow_negative_personal,
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Port of the /live, /ready and /metrics server.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory holding `state.json` and `audit/`.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      bind_address: default_bind_address(),
    }
  }
}

impl Default for LedgerConfig {
  fn default() -> Self {
    Self {
      low_balance_threshold: default_low_balance_threshold(),
      allow_negative_personal: true,
      history_limit: default_history_limit(),
    }
  }
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      health_port: default_health_port(),
    }
  }
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "bet-ledger".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "127.0.0.1:3000".to_string()
}

fn default_low_balance_threshold() -> Decimal {
  dec!(150)
}

fn default_true() -> bool {
  true
}

fn default_history_limit() -> usize {
  30
}

fn default_health_port() -> u16 {
  9090
}

fn default_data_dir() -> String {
  "data".to_string()
}
