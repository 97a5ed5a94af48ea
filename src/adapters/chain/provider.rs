//! Node Provider - alloy-rs 0.9 Connection Management
//!
//! Connects to the ledger node over HTTP or a local IPC socket and
//! exposes a shared, type-erased provider for the gateway. The node
//! manages the accounts and signs on their behalf.
//!
//! `on_builtin` picks the transport from the connection string and
//! yields a provider over `BoxTransport`, so both transports share the
//! default `dyn Provider` type.

use std::sync::Arc;

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::config::{ProviderConfig, ProviderKind};

/// Shared node provider backed by alloy-rs 0.9.
pub struct ChainProvider {
    /// The alloy provider (type-erased).
    provider: Arc<dyn Provider + Send + Sync>,
}

impl ChainProvider {
    /// Connect to the configured node and check the chain id.
    ///
    /// When `expected_chain_id` is set, any other chain is refused
    /// before a single transaction is built.
    #[instrument(skip_all, fields(kind = ?config.kind))]
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let target = match config.kind {
            ProviderKind::Http => config.url.clone(),
            ProviderKind::Ipc => config
                .url
                .strip_prefix("ipc://")
                .unwrap_or(&config.url)
                .to_string(),
        };

        let provider = ProviderBuilder::new()
            .on_builtin(&target)
            .await
            .with_context(|| format!("Failed to connect to node at {target}"))?;

        // Wrap in Arc<dyn Provider> for type erasure
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(provider);

        let chain_id = provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;

        if let Some(expected) = config.expected_chain_id {
            anyhow::ensure!(
                chain_id == expected,
                "Expected chain_id={expected}, node reports {chain_id}"
            );
        }

        info!(chain_id, "Connected to node");

        Ok(Self { provider })
    }

    /// Get a shared reference to the alloy provider (type-erased).
    pub fn inner(&self) -> Arc<dyn Provider + Send + Sync> {
        Arc::clone(&self.provider)
    }
}
