//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "BET_LEDGER_CONFIG";

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)
    .with_context(|| format!("Invalid configuration in {}", path.display()))?;

  info!(
    path = %path.display(),
    data_dir = %config.persistence.data_dir,
    bind = %config.service.bind_address,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse TOML")?;
  validate_config(&config)?;
  Ok(config)
}

/// Resolve the config path from `BET_LEDGER_CONFIG` (or the default)
/// and load it. A missing file yields the built-in defaults.
pub fn load_from_env() -> Result<AppConfig> {
  let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
  if !Path::new(&path).exists() {
    let config = AppConfig::default();
    validate_config(&config)?;
    return Ok(config);
  }
  load_config(&path)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty names, addresses and paths
/// - Non-negative thresholds
/// - Sensible limits and ports
pub fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    !config.service.name.trim().is_empty(),
    "service.name must not be empty"
  );
  anyhow::ensure!(
    !config.service.bind_address.trim().is_empty(),
    "service.bind_address must not be empty"
  );

  anyhow::ensure!(
    config.ledger.low_balance_threshold >= Decimal::ZERO,
    "ledger.low_balance_threshold must not be negative, got {}",
    config.ledger.low_balance_threshold
  );
  anyhow::ensure!(
    config.ledger.history_limit > 0,
    "ledger.history_limit must be positive"
  );

  anyhow::ensure!(
    !config.metrics.enabled || config.metrics.health_port > 0,
    "metrics.health_port must be set when metrics are enabled"
  );

  anyhow::ensure!(
    !config.persistence.data_dir.trim().is_empty(),
    "persistence.data_dir must not be empty"
  );

  Ok(())
}
