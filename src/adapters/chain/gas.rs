//! Gas Oracle - Legacy Fee Bound Estimation
//!
//! Every transaction carries an explicit gas limit, estimated for the
//! exact call and sender, and the node's current gas price. A call that
//! would revert fails here, before anything reaches the pool.

use std::sync::Arc;

use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use tracing::{debug, instrument};

use crate::error::ClientError;
use crate::ports::chain_gateway::FeeBound;

pub struct GasOracle {
    provider: Arc<dyn Provider + Send + Sync>,
}

impl GasOracle {
    pub fn new(provider: Arc<dyn Provider + Send + Sync>) -> Self {
        Self { provider }
    }

    /// Estimate the fee bound for `tx` (which must carry its sender).
    ///
    /// # Errors
    /// `TransactionReverted` when estimation fails, `Rpc` when the gas
    /// price cannot be read.
    #[instrument(skip_all)]
    pub async fn fee_bound(&self, tx: &TransactionRequest) -> Result<FeeBound, ClientError> {
        let gas_limit = self
            .provider
            .estimate_gas(tx)
            .await
            .map_err(|e| ClientError::TransactionReverted {
                tx_hash: None,
                reason: format!("gas estimation failed: {e}"),
            })?;

        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| ClientError::Rpc(format!("gas price query failed: {e}")))?;

        debug!(gas_limit, gas_price = %gas_price, "Fee bound estimated");
        Ok(FeeBound { gas_limit, gas_price })
    }
}
