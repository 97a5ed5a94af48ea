//! Alloy Gateway - `ChainGateway` over a JSON-RPC node
//!
//! Transactions are sent with `eth_sendTransaction`; the node holds the
//! keys for every account it lists. Each transaction carries an explicit
//! gas limit and legacy gas price from the `GasOracle`.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::ClientError;
use crate::ports::chain_gateway::{ChainGateway, ContractCall, FeeBound, TxReceipt};

use super::confirmation::{InclusionStatus, wait_for_inclusion};
use super::gas::GasOracle;
use super::provider::ChainProvider;

pub struct AlloyGateway {
    provider: Arc<dyn Provider + Send + Sync>,
    gas: GasOracle,
    poll_interval: Duration,
}

impl AlloyGateway {
    pub fn new(provider: &ChainProvider, poll_interval: Duration) -> Self {
        let inner = provider.inner();
        Self {
            gas: GasOracle::new(Arc::clone(&inner)),
            provider: inner,
            poll_interval,
        }
    }

    fn request(call: &ContractCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.input.clone())
    }

    async fn fetch_inclusion(&self, tx_hash: TxHash) -> Result<Option<InclusionStatus>, ClientError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;

        Ok(receipt.map(|r| InclusionStatus {
            success: ReceiptResponse::status(&r),
            block_number: ReceiptResponse::block_number(&r).unwrap_or_default(),
        }))
    }
}

#[async_trait]
impl ChainGateway for AlloyGateway {
    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.provider
            .get_accounts()
            .await
            .map_err(|e| ClientError::Rpc(format!("eth_accounts failed: {e}")))
    }

    async fn has_code(&self, address: Address) -> Result<bool, ClientError> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| ClientError::Rpc(format!("eth_getCode failed: {e}")))?;
        Ok(!code.is_empty())
    }

    async fn estimate_fee(&self, call: &ContractCall, sender: Address) -> Result<FeeBound, ClientError> {
        let tx = Self::request(call).with_from(sender);
        self.gas.fee_bound(&tx).await
    }

    #[instrument(skip_all, fields(method = call.method, sender = %sender))]
    async fn submit_transaction(
        &self,
        call: &ContractCall,
        sender: Address,
        fee: FeeBound,
    ) -> Result<TxHash, ClientError> {
        let tx = Self::request(call)
            .with_from(sender)
            .with_gas_limit(fee.gas_limit)
            .with_gas_price(fee.gas_price);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ClientError::Rpc(format!("eth_sendTransaction failed: {e}")))?;

        Ok(*pending.tx_hash())
    }

    async fn await_confirmation(&self, tx_hash: TxHash, timeout: Duration) -> Result<TxReceipt, ClientError> {
        debug!(tx_hash = %tx_hash, timeout_secs = timeout.as_secs(), "Waiting for inclusion");
        wait_for_inclusion(tx_hash, timeout, self.poll_interval, || self.fetch_inclusion(tx_hash)).await
    }

    async fn call_view(&self, call: &ContractCall) -> Result<Bytes, ClientError> {
        let tx = Self::request(call);
        self.provider
            .call(&tx)
            .await
            .map_err(|e| ClientError::view(call.method, e))
    }
}
