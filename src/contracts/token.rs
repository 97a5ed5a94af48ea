//! NGT token binding: minting, allowances and balance reads.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};

use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;

use super::artifact::ContractArtifact;
use super::bindings::{INgt, NGT_FUNCTIONS};
use super::proxy::{ContractProxy, TxOutcome};

pub struct TokenContract<G: ChainGateway> {
    proxy: ContractProxy<G>,
}

impl<G: ChainGateway> TokenContract<G> {
    pub async fn bind(
        gateway: Arc<G>,
        address: Address,
        artifact: &ContractArtifact,
        confirmation_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let proxy = ContractProxy::bind(
            gateway,
            "NGT",
            address,
            artifact,
            NGT_FUNCTIONS,
            confirmation_timeout,
        )
        .await?;
        Ok(Self { proxy })
    }

    pub fn address(&self) -> Address {
        self.proxy.address()
    }

    /// Mint `amount` tokens to `beneficiary`, sent by the token owner.
    pub async fn mint(&self, minter: Address, beneficiary: Address, amount: U256) -> TxOutcome {
        self.proxy
            .transact(INgt::mintCall { beneficiary, amount }, minter)
            .await
    }

    /// Raise the allowance `owner` grants to `spender` by `amount`.
    pub async fn increase_allowance(&self, owner: Address, spender: Address, amount: U256) -> TxOutcome {
        self.proxy
            .transact(
                INgt::increaseAllowanceCall {
                    spender,
                    addedValue: amount,
                },
                owner,
            )
            .await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, ClientError> {
        Ok(self.proxy.view(INgt::balanceOfCall { account }).await?.balance)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ClientError> {
        Ok(self
            .proxy
            .view(INgt::allowanceCall { owner, spender })
            .await?
            .remaining)
    }
}
