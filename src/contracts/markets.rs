//! Markets manager binding: the per-DSO market lifecycle contract.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};

use crate::domain::market::MarketParameters;
use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;

use super::artifact::ContractArtifact;
use super::bindings::{IMarketsManager, MARKETS_MANAGER_FUNCTIONS};
use super::proxy::{ContractProxy, TxOutcome};

/// Arguments of an `open` call.
#[derive(Debug, Clone, Copy)]
pub struct OpenRequest<'a> {
    pub player: Address,
    pub referee: Address,
    pub start_epoch: u64,
    pub market_type: u8,
    pub params: &'a MarketParameters,
}

pub struct MarketsManager<G: ChainGateway> {
    proxy: ContractProxy<G>,
}

impl<G: ChainGateway> MarketsManager<G> {
    pub async fn bind(
        gateway: Arc<G>,
        address: Address,
        artifact: &ContractArtifact,
        confirmation_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let proxy = ContractProxy::bind(
            gateway,
            "MarketsManager",
            address,
            artifact,
            MARKETS_MANAGER_FUNCTIONS,
            confirmation_timeout,
        )
        .await?;
        Ok(Self { proxy })
    }

    pub fn address(&self) -> Address {
        self.proxy.address()
    }

    /// Open a market, sent by the DSO.
    pub async fn open(&self, dso: Address, request: OpenRequest<'_>) -> TxOutcome {
        let p = request.params;
        let call = IMarketsManager::openCall {
            player: request.player,
            startTime: U256::from(request.start_epoch),
            marketType: request.market_type,
            referee: request.referee,
            maxLower: U256::from(p.max_lower),
            maxUpper: U256::from(p.max_upper),
            revenueFactor: U256::from(p.revenue_factor),
            penaltyFactor: U256::from(p.penalty_factor),
            dsoStaking: U256::from(p.dso_staking),
            playerStaking: U256::from(p.player_staking),
            percReferee: U256::from(p.perc_referee),
        };
        self.proxy.transact(call, dso).await
    }

    pub async fn confirm_opening(&self, player: Address, idx: U256, staking: U256) -> TxOutcome {
        self.proxy
            .transact(IMarketsManager::confirmOpeningCall { idx, staking }, player)
            .await
    }

    pub async fn settle(&self, dso: Address, idx: U256, power_peak: u64) -> TxOutcome {
        self.proxy
            .transact(
                IMarketsManager::settleCall {
                    idx,
                    powerPeak: U256::from(power_peak),
                },
                dso,
            )
            .await
    }

    pub async fn confirm_settlement(&self, player: Address, idx: U256, power_peak: u64) -> TxOutcome {
        self.proxy
            .transact(
                IMarketsManager::confirmSettlementCall {
                    idx,
                    powerPeak: U256::from(power_peak),
                },
                player,
            )
            .await
    }

    /// Contract-side state code of a market.
    pub async fn get_state(&self, idx: U256) -> Result<u8, ClientError> {
        Ok(self.proxy.view(IMarketsManager::getStateCall { idx }).await?.state)
    }

    pub async fn get_flag(&self, idx: U256) -> Result<bool, ClientError> {
        Ok(self.proxy.view(IMarketsManager::getFlagCall { idx }).await?.exists)
    }

    pub async fn get_start_time(&self, idx: U256) -> Result<U256, ClientError> {
        Ok(self
            .proxy
            .view(IMarketsManager::getStartTimeCall { idx })
            .await?
            .startTime)
    }

    pub async fn get_end_time(&self, idx: U256) -> Result<U256, ClientError> {
        Ok(self
            .proxy
            .view(IMarketsManager::getEndTimeCall { idx })
            .await?
            .endTime)
    }

    pub async fn get_player(&self, idx: U256) -> Result<Address, ClientError> {
        Ok(self.proxy.view(IMarketsManager::getPlayerCall { idx }).await?.player)
    }

    /// Market identifier as derived by the contract. Authoritative.
    pub async fn calc_idx(&self, player: Address, start_epoch: u64, market_type: u8) -> Result<U256, ClientError> {
        Ok(self
            .proxy
            .view(IMarketsManager::calcIdxCall {
                player,
                startTime: U256::from(start_epoch),
                marketType: market_type,
            })
            .await?
            .idx)
    }
}
