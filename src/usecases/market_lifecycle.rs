//! Market Lifecycle Use Case - Open, Confirm, Settle, Confirm Settlement
//!
//! Drives one market through its on-chain sequence:
//! 1. `open` (DSO) with a start time derived from the market type
//! 2. `confirmOpening` (player) with the configured player staking
//! 3. `settle` (DSO) with a measured power peak
//! 4. `confirmSettlement` (player) with the same power peak
//!
//! Each step waits for its transaction to be mined before the local
//! phase advances. A failed step leaves the phase where it was and is
//! never retried here. View failures propagate.

use std::time::Duration;

use alloy::primitives::U256;
use tracing::{info, instrument, warn};

use crate::contracts::markets::{MarketsManager, OpenRequest};
use crate::contracts::proxy::TxOutcome;
use crate::domain::actors::Actors;
use crate::domain::market::{MarketParameters, MarketPhase, MarketStart, MarketType, TrackedMarket};
use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;
use crate::ports::clock::{Clock, SystemClock};

/// Market type code handed to `calcIdx`, whatever type was opened.
///
/// Only equivalent to the opened type when the contract derivation is
/// type-invariant. Kept as deployed clients rely on the resulting idx.
pub const CALC_IDX_MARKET_TYPE: u8 = 2;

/// Result of an `open` attempt.
#[derive(Debug, Clone)]
#[must_use]
pub enum MarketOpening {
  /// Mined; the idx comes from the contract.
  Opened(TrackedMarket),
  /// Did not happen. Nothing later may be attempted for this market.
  Failed(ClientError),
}

impl MarketOpening {
  /// Market idx, or `None` where callers of the old protocol saw -1.
  pub fn idx(&self) -> Option<U256> {
    match self {
      Self::Opened(market) => Some(market.idx),
      Self::Failed(_) => None,
    }
  }

  pub fn into_market(self) -> Option<TrackedMarket> {
    match self {
      Self::Opened(market) => Some(market),
      Self::Failed(_) => None,
    }
  }
}

/// Lifecycle operations for markets of one DSO.
pub struct MarketLifecycle<G: ChainGateway, K: Clock = SystemClock> {
  markets: MarketsManager<G>,
  actors: Actors,
  params: MarketParameters,
  clock: K,
}

impl<G: ChainGateway, K: Clock> MarketLifecycle<G, K> {
  pub fn new(markets: MarketsManager<G>, actors: Actors, params: MarketParameters, clock: K) -> Self {
    Self {
      markets,
      actors,
      params,
      clock,
    }
  }

  pub fn markets(&self) -> &MarketsManager<G> {
    &self.markets
  }

  pub fn actors(&self) -> &Actors {
    &self.actors
  }

  pub fn params(&self) -> &MarketParameters {
    &self.params
  }

  /// Open a market starting at the next period boundary.
  ///
  /// Returns `Ok(MarketOpening::Failed)` when the type is unsupported
  /// (nothing submitted) or the transaction failed. Returns `Err` when
  /// a view read after the opening fails.
  #[instrument(skip(self), fields(market_type = self.params.market_type))]
  pub async fn open(&self) -> Result<MarketOpening, ClientError> {
    let market_type = match MarketType::try_from(self.params.market_type) {
      Ok(market_type) => market_type,
      Err(e) => {
        warn!(error = %e, "Market not opened");
        return Ok(MarketOpening::Failed(e));
      }
    };

    let start = MarketStart::derive(self.clock.now(), market_type);
    let request = OpenRequest {
      player: self.actors.player,
      referee: self.actors.referee,
      start_epoch: start.epoch,
      market_type: market_type.code(),
      params: &self.params,
    };

    if let TxOutcome::Failed(e) = self.markets.open(self.actors.dso, request).await {
      return Ok(MarketOpening::Failed(e));
    }

    let idx = self
      .markets
      .calc_idx(self.actors.player, start.epoch, CALC_IDX_MARKET_TYPE)
      .await?;
    info!(idx = %idx, start_time = start.epoch, "Created market");

    let exists = self.markets.get_flag(idx).await?;
    let player = self.markets.get_player(idx).await?;
    let start_time = self.markets.get_start_time(idx).await?;
    let end_time = self.markets.get_end_time(idx).await?;
    let state = self.markets.get_state(idx).await?;
    info!(
      idx = %idx,
      exists,
      player = %player,
      start_time = %start_time,
      end_time = %end_time,
      state,
      "Market details"
    );

    Ok(MarketOpening::Opened(TrackedMarket::opened(
      idx,
      self.actors.player,
      start,
      market_type,
    )))
  }

  /// Player confirms the opening, staking the configured amount.
  pub async fn confirm_opening(&self, market: &mut TrackedMarket) -> Result<TxOutcome, ClientError> {
    market.ensure_next(MarketPhase::OpeningConfirmed, "confirm opening")?;

    let staking = U256::from(self.params.player_staking);
    let outcome = self
      .markets
      .confirm_opening(self.actors.player, market.idx, staking)
      .await;

    if outcome.is_confirmed() {
      market.advance(MarketPhase::OpeningConfirmed);
    }
    Ok(outcome)
  }

  /// DSO settles the market with the measured power peak.
  pub async fn settle(&self, market: &mut TrackedMarket, power_peak: u64) -> Result<TxOutcome, ClientError> {
    market.ensure_next(MarketPhase::Settled, "settle")?;

    let outcome = self.markets.settle(self.actors.dso, market.idx, power_peak).await;

    if outcome.is_confirmed() {
      market.advance(MarketPhase::Settled);
      market.record_power_peak(power_peak);
    }
    Ok(outcome)
  }

  /// Player confirms the settlement with its own power peak reading.
  pub async fn confirm_settlement(
    &self,
    market: &mut TrackedMarket,
    power_peak: u64,
  ) -> Result<TxOutcome, ClientError> {
    market.ensure_next(MarketPhase::SettlementConfirmed, "confirm settlement")?;

    let outcome = self
      .markets
      .confirm_settlement(self.actors.player, market.idx, power_peak)
      .await;

    if outcome.is_confirmed() {
      market.advance(MarketPhase::SettlementConfirmed);
    }
    Ok(outcome)
  }

  /// Contract-side state code, for logging.
  pub async fn state_of(&self, market: &TrackedMarket) -> Result<u8, ClientError> {
    self.markets.get_state(market.idx).await
  }

  /// Time left until the market's on-chain end time plus `margin`.
  ///
  /// Zero when the end time (plus margin) is already behind us.
  pub async fn settlement_wait(&self, market: &TrackedMarket, margin: Duration) -> Result<Duration, ClientError> {
    let end_time = self.markets.get_end_time(market.idx).await?;
    let end_time = i128::from(u64::try_from(end_time).unwrap_or(u64::MAX));

    let remaining = end_time - i128::from(self.clock.epoch_seconds()) + i128::from(margin.as_secs());
    let remaining = u64::try_from(remaining.max(0)).unwrap_or(u64::MAX);
    Ok(Duration::from_secs(remaining))
  }
}
