//! Contract Proxy - Uniform Transaction Protocol
//!
//! Every state-mutating call goes through the same steps:
//! 1. Encode the typed call
//! 2. Estimate the fee bound
//! 3. Submit as the caller-supplied sender
//! 4. Wait for inclusion within the confirmation timeout
//! 5. Log submission and inclusion
//!
//! Failures in steps 2–4 are logged and returned as `TxOutcome::Failed`;
//! they are never retried. Views call straight through and propagate
//! their errors.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::sol_types::SolCall;
use tracing::{error, info, instrument};

use crate::error::ClientError;
use crate::ports::chain_gateway::{ChainGateway, ContractCall, TxReceipt};

use super::artifact::ContractArtifact;
use super::bindings::RequiredFunction;

/// Result of a state-mutating call.
#[derive(Debug, Clone)]
#[must_use = "a failed transaction is reported here, not raised"]
pub enum TxOutcome {
    /// Mined successfully.
    Confirmed(TxReceipt),
    /// Did not happen: estimation, submission or confirmation failed.
    Failed(ClientError),
}

impl TxOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            Self::Confirmed(receipt) => Some(receipt),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::Confirmed(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}

/// A contract bound to an address, validated against its artifact.
pub struct ContractProxy<G: ChainGateway> {
    gateway: Arc<G>,
    name: &'static str,
    address: Address,
    confirmation_timeout: Duration,
}

impl<G: ChainGateway> ContractProxy<G> {
    /// Bind to `address`, failing fast if the artifact lacks a required
    /// function or the address holds no deployed code.
    #[instrument(skip_all, fields(contract = name, address = %address))]
    pub async fn bind(
        gateway: Arc<G>,
        name: &'static str,
        address: Address,
        artifact: &ContractArtifact,
        required: &[RequiredFunction],
        confirmation_timeout: Duration,
    ) -> Result<Self, ClientError> {
        artifact.ensure_exposes(name, required)?;

        let has_code = gateway
            .has_code(address)
            .await
            .map_err(|e| ClientError::binding(name, format!("code lookup failed: {e}")))?;
        if !has_code {
            return Err(ClientError::binding(
                name,
                format!("no deployed code at {address}"),
            ));
        }

        info!(contract = name, address = %address, "Contract bound");

        Ok(Self {
            gateway,
            name,
            address,
            confirmation_timeout,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn encode<C: SolCall>(&self, call: &C) -> ContractCall {
        ContractCall {
            to: self.address,
            input: call.abi_encode().into(),
            method: C::SIGNATURE,
        }
    }

    /// Run the transaction protocol for `call` as `sender`.
    pub async fn transact<C: SolCall>(&self, call: C, sender: Address) -> TxOutcome {
        let request = self.encode(&call);
        match self.submit_and_wait(&request, sender).await {
            Ok(receipt) => TxOutcome::Confirmed(receipt),
            Err(e) => {
                error!(
                    contract = self.name,
                    method = C::SIGNATURE,
                    sender = %sender,
                    error = %e,
                    "Transaction failed"
                );
                TxOutcome::Failed(e)
            }
        }
    }

    async fn submit_and_wait(&self, call: &ContractCall, sender: Address) -> Result<TxReceipt, ClientError> {
        let fee = self.gateway.estimate_fee(call, sender).await?;

        let tx_hash = self.gateway.submit_transaction(call, sender, fee).await?;
        info!(
            contract = self.name,
            method = call.method,
            sender = %sender,
            tx_hash = %tx_hash,
            gas_limit = fee.gas_limit,
            gas_price = %fee.gas_price,
            "Transaction created into the pool"
        );

        let receipt = self
            .gateway
            .await_confirmation(tx_hash, self.confirmation_timeout)
            .await?;
        info!(
            contract = self.name,
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            "Transaction mined"
        );

        Ok(receipt)
    }

    /// Read-only call; errors propagate.
    pub async fn view<C: SolCall>(&self, call: C) -> Result<C::Return, ClientError> {
        let request = self.encode(&call);
        let raw = self.gateway.call_view(&request).await?;
        C::abi_decode_returns(&raw, true).map_err(|e| ClientError::view(C::SIGNATURE, e))
    }
}
