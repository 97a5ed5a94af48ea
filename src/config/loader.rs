//! Configuration Loader - File Loading and Validation
//!
//! Handles loading the TOML config, validating all parameters,
//! and providing clear error messages for misconfiguration before
//! anything touches the chain.

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::market::MarketType;

use super::{AppConfig, ProviderKind};

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails (including missing fields)
/// - Validation rules are violated
pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig> {
  let path = path.as_ref();

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)
    .with_context(|| format!("Invalid configuration in {}", path.display()))?;

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse TOML")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A usable provider endpoint and positive timeouts
/// - Checksum-valid contract addresses and non-empty artifact names
/// - A supported market type and a sane referee share
/// - An ordered power range
fn validate_config(config: &AppConfig) -> Result<()> {
  // Provider validation
  let provider = &config.provider;
  anyhow::ensure!(!provider.url.is_empty(), "provider.url must not be empty");
  if provider.kind == ProviderKind::Http {
    anyhow::ensure!(
      provider.url.starts_with("http://") || provider.url.starts_with("https://"),
      "provider.url must be an http(s) URL for kind = \"http\", got {}",
      provider.url
    );
  }
  if provider.kind == ProviderKind::Ipc {
    anyhow::ensure!(
      !["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| provider.url.starts_with(scheme)),
      "provider.url must be a socket path for kind = \"ipc\", got {}",
      provider.url
    );
  }
  anyhow::ensure!(
    provider.confirmation_timeout_secs > 0,
    "provider.confirmation_timeout_secs must be positive"
  );
  anyhow::ensure!(
    provider.poll_interval_ms > 0,
    "provider.poll_interval_ms must be positive"
  );

  // Contract validation
  let contracts = &config.contracts;
  anyhow::ensure!(
    !contracts.project_dir.is_empty(),
    "contracts.project_dir must not be empty"
  );
  for (name, descriptor) in [
    ("ngt", &contracts.ngt),
    ("groups_manager", &contracts.groups_manager),
  ] {
    descriptor
      .address()
      .with_context(|| format!("contracts.{name}.address"))?;
    anyhow::ensure!(
      !descriptor.file_name.is_empty(),
      "contracts.{name}.file_name must not be empty"
    );
  }
  anyhow::ensure!(
    !contracts.markets_manager.file_name.is_empty(),
    "contracts.markets_manager.file_name must not be empty"
  );

  // Market validation
  MarketType::try_from(config.market.market_type).context("market.market_type")?;
  anyhow::ensure!(
    config.market.perc_referee <= 100,
    "market.perc_referee must be in [0, 100], got {}",
    config.market.perc_referee
  );

  // Simulation validation
  anyhow::ensure!(
    config.simulation.min_power <= config.simulation.max_power,
    "simulation.min_power ({}) must not exceed simulation.max_power ({})",
    config.simulation.min_power,
    config.simulation.max_power
  );

  Ok(())
}
