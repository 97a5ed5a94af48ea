//! Configuration Module - TOML-based Client Configuration
//!
//! Every recognized field is enumerated here and validated at load time
//! (see `loader`). Contract addresses, wallet roles, market defaults and
//! bootstrap amounts are all externalized - nothing is hardcoded in the
//! domain layer.

pub mod loader;

use std::time::Duration;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::domain::actors::{RoleIndices, normalize_address};
use crate::domain::market::MarketParameters;
use crate::error::ClientError;

/// Top-level client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Client identity and logging.
  #[serde(default)]
  pub client: ClientConfig,
  /// Node connection.
  pub provider: ProviderConfig,
  /// Account indices of each role.
  pub wallets: WalletsConfig,
  /// Deployed contracts and their artifacts.
  pub contracts: ContractsConfig,
  /// Defaults every opened market uses.
  pub market: MarketParameters,
  /// Bootstrap minting and allowance amounts.
  pub tokens: TokensConfig,
  /// Simulation loop settings.
  pub simulation: SimulationConfig,
}

impl AppConfig {
  /// Record the loaded configuration. Call once the subscriber is installed.
  pub fn log_loaded(&self, path: &std::path::Path) {
    tracing::info!(
      path = %path.display(),
      provider = ?self.provider.kind,
      market_type = self.market.market_type,
      "Configuration loaded successfully"
    );
  }
}

/// Client identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
  /// Human-readable client name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
    }
  }
}

/// Transport used to reach the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
  Http,
  Ipc,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
  /// `http` or `ipc`.
  pub kind: ProviderKind,
  /// HTTP endpoint URL or IPC socket path.
  pub url: String,
  /// Refuse to start against any other chain.
  pub expected_chain_id: Option<u64>,
  /// How long to wait for a transaction to be mined (seconds).
  #[serde(default = "default_confirmation_timeout")]
  pub confirmation_timeout_secs: u64,
  /// Receipt polling interval (milliseconds).
  #[serde(default = "default_poll_interval")]
  pub poll_interval_ms: u64,
}

impl ProviderConfig {
  pub fn confirmation_timeout(&self) -> Duration {
    Duration::from_secs(self.confirmation_timeout_secs)
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }
}

/// Indices into the node's account list.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WalletsConfig {
  pub owner: usize,
  pub dso: usize,
  pub player: usize,
  pub referee: usize,
}

impl WalletsConfig {
  pub fn roles(&self) -> RoleIndices {
    RoleIndices {
      owner: self.owner,
      dso: self.dso,
      player: self.player,
      referee: self.referee,
    }
  }
}

/// Deployed contract at a fixed address.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractDescriptor {
  /// Deployment address (checked against its checksum).
  pub address: String,
  /// Artifact file name under `build/contracts/`.
  pub file_name: String,
}

impl ContractDescriptor {
  pub fn address(&self) -> Result<Address, ClientError> {
    normalize_address(&self.address)
  }
}

/// Contract whose address is discovered at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactDescriptor {
  pub file_name: String,
}

/// Contract deployment configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
  /// Contract project root; artifacts are read from `build/contracts/`.
  pub project_dir: String,
  /// NGT token.
  pub ngt: ContractDescriptor,
  /// Groups registry.
  pub groups_manager: ContractDescriptor,
  /// Markets manager; the address comes from the DSO's group.
  pub markets_manager: ArtifactDescriptor,
}

/// Token amounts used by the bootstrap command.
#[derive(Debug, Clone, Deserialize)]
pub struct TokensConfig {
  pub minting: MintingConfig,
  pub allowance: AllowanceConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MintingConfig {
  pub dso: u64,
  pub player: u64,
  pub referee: u64,
}

/// Allowances granted to the markets manager.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AllowanceConfig {
  pub dso_to_market: u64,
  pub player_to_market: u64,
}

/// Simulation loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
  /// Lower bound of the simulated power peak (kW).
  pub min_power: u64,
  /// Upper bound of the simulated power peak (kW).
  pub max_power: u64,
  /// Pause between a step and its confirmation (seconds).
  #[serde(default = "default_step_delay")]
  pub step_delay_secs: u64,
  /// Extra wait past the market end before settling (seconds).
  #[serde(default = "default_settle_margin")]
  pub settle_margin_secs: u64,
  /// Pause between cycles (seconds).
  #[serde(default = "default_cycle_pause")]
  pub cycle_pause_secs: u64,
}

// Default value functions for serde

fn default_name() -> String {
  "energy-market-client".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_confirmation_timeout() -> u64 {
  300
}

fn default_poll_interval() -> u64 {
  1_000
}

fn default_step_delay() -> u64 {
  1
}

fn default_settle_margin() -> u64 {
  10
}

fn default_cycle_pause() -> u64 {
  5
}
