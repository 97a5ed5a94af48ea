//! Simulation Use Case - Continuous Market Cycles
//!
//! Repeats open → confirm opening → (wait for market end) → settle →
//! confirm settlement with a random power peak, pausing between steps.
//! A failed step aborts the current cycle and the loop moves on to a
//! fresh market. Every pacing sleep, including the end-time wait, is
//! cut short by the shutdown signal.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, instrument, warn};

use crate::config::SimulationConfig;
use crate::contracts::proxy::TxOutcome;
use crate::contracts::token::TokenContract;
use crate::domain::market::TrackedMarket;
use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;
use crate::ports::clock::Clock;

use super::market_lifecycle::{MarketLifecycle, MarketOpening};

/// Pauses inserted by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
  /// Between a step and its confirmation.
  pub step_delay: Duration,
  /// Past the market end time before settling.
  pub settle_margin: Duration,
  /// Between cycles.
  pub cycle_pause: Duration,
}

impl Pacing {
  pub fn from_config(config: &SimulationConfig) -> Self {
    Self {
      step_delay: Duration::from_secs(config.step_delay_secs),
      settle_margin: Duration::from_secs(config.settle_margin_secs),
      cycle_pause: Duration::from_secs(config.cycle_pause_secs),
    }
  }
}

impl Default for Pacing {
  fn default() -> Self {
    Self {
      step_delay: Duration::from_secs(1),
      settle_margin: Duration::from_secs(10),
      cycle_pause: Duration::from_secs(5),
    }
  }
}

/// Uniform integer power peaks in `[min, max]` kW.
pub struct PowerPeakSampler {
  rng: StdRng,
  min: u64,
  max: u64,
}

impl PowerPeakSampler {
  pub fn from_entropy(min: u64, max: u64) -> Self {
    Self::with_rng(StdRng::from_entropy(), min, max)
  }

  /// Reproducible sequence for a given seed.
  pub fn seeded(min: u64, max: u64, seed: u64) -> Self {
    Self::with_rng(StdRng::seed_from_u64(seed), min, max)
  }

  fn with_rng(rng: StdRng, min: u64, max: u64) -> Self {
    // gen_range panics on an inverted range.
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    Self { rng, min, max }
  }

  pub fn sample(&mut self) -> u64 {
    self.rng.gen_range(self.min..=self.max)
  }
}

/// Cycle counts reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationSummary {
  /// Cycles that reached confirmed settlement.
  pub completed: u64,
  /// Cycles cut short by a failed transaction.
  pub aborted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
  Completed,
  Aborted,
  Stopped,
}

/// The continuous simulation over one lifecycle.
pub struct Simulation<'a, G: ChainGateway, K: Clock> {
  lifecycle: &'a MarketLifecycle<G, K>,
  token: &'a TokenContract<G>,
  sampler: PowerPeakSampler,
  pacing: Pacing,
}

impl<'a, G: ChainGateway, K: Clock> Simulation<'a, G, K> {
  pub fn new(
    lifecycle: &'a MarketLifecycle<G, K>,
    token: &'a TokenContract<G>,
    sampler: PowerPeakSampler,
    pacing: Pacing,
  ) -> Self {
    Self {
      lifecycle,
      token,
      sampler,
      pacing,
    }
  }

  /// Run cycles until `shutdown` fires.
  ///
  /// # Errors
  /// A failed view read ends the loop with that error.
  #[instrument(skip_all)]
  pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<SimulationSummary, ClientError> {
    let mut summary = SimulationSummary::default();
    info!(
      pacing = ?self.pacing,
      market_type = self.lifecycle.params().market_type,
      "Simulation started"
    );

    loop {
      if stop_requested(&mut shutdown) {
        break;
      }

      match self.run_cycle(&mut shutdown).await? {
        CycleEnd::Completed => summary.completed += 1,
        CycleEnd::Aborted => summary.aborted += 1,
        CycleEnd::Stopped => break,
      }

      info!(secs = self.pacing.cycle_pause.as_secs(), "Wait before next market");
      if !pace(&mut shutdown, self.pacing.cycle_pause).await {
        break;
      }
    }

    info!(
      completed = summary.completed,
      aborted = summary.aborted,
      "Simulation stopped"
    );
    Ok(summary)
  }

  async fn run_cycle(&mut self, shutdown: &mut broadcast::Receiver<()>) -> Result<CycleEnd, ClientError> {
    info!("Open the market");
    let mut market = match self.lifecycle.open().await? {
      MarketOpening::Opened(market) => market,
      MarketOpening::Failed(e) => {
        warn!(error = %e, "Market opening failed, cycle aborted");
        return Ok(CycleEnd::Aborted);
      }
    };
    self.log_state(&market).await?;

    if !pace(shutdown, self.pacing.step_delay).await {
      return Ok(CycleEnd::Stopped);
    }

    info!(idx = %market.idx, "Confirm the market opening");
    let outcome = self.lifecycle.confirm_opening(&mut market).await?;
    if let Some(end) = abort_on_failure(&market, &outcome) {
      return Ok(end);
    }
    self.log_state(&market).await?;
    self.log_balances().await?;

    let power_peak = self.sampler.sample();
    info!(idx = %market.idx, power_peak, "Simulated measured power peak (kW)");

    let wait = self
      .lifecycle
      .settlement_wait(&market, self.pacing.settle_margin)
      .await?;
    info!(idx = %market.idx, secs = wait.as_secs(), "Wait for the market end");
    if !pace(shutdown, wait).await {
      return Ok(CycleEnd::Stopped);
    }

    info!(idx = %market.idx, "Settle the market");
    let outcome = self.lifecycle.settle(&mut market, power_peak).await?;
    if let Some(end) = abort_on_failure(&market, &outcome) {
      return Ok(end);
    }
    self.log_state(&market).await?;

    if !pace(shutdown, self.pacing.step_delay).await {
      return Ok(CycleEnd::Stopped);
    }

    info!(idx = %market.idx, "Confirm the market settlement");
    let outcome = self.lifecycle.confirm_settlement(&mut market, power_peak).await?;
    if let Some(end) = abort_on_failure(&market, &outcome) {
      return Ok(end);
    }
    self.log_state(&market).await?;
    self.log_balances().await?;

    Ok(CycleEnd::Completed)
  }

  async fn log_state(&self, market: &TrackedMarket) -> Result<(), ClientError> {
    let state = self.lifecycle.state_of(market).await?;
    info!(idx = %market.idx, state, phase = %market.phase(), "Market state");
    Ok(())
  }

  async fn log_balances(&self) -> Result<(), ClientError> {
    let actors = self.lifecycle.actors();
    let dso = self.token.balance_of(actors.dso).await?;
    let player = self.token.balance_of(actors.player).await?;
    info!(dso_balance = %dso, player_balance = %player, "Balances");
    Ok(())
  }
}

fn abort_on_failure(market: &TrackedMarket, outcome: &TxOutcome) -> Option<CycleEnd> {
  let e = outcome.error()?;
  warn!(idx = %market.idx, phase = %market.phase(), error = %e, "Step failed, cycle aborted");
  Some(CycleEnd::Aborted)
}

/// Non-blocking check; a closed or lagged channel counts as a stop.
fn stop_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
  !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}

/// Sleep for `duration` unless shutdown fires first. `false` means stop.
async fn pace(shutdown: &mut broadcast::Receiver<()>, duration: Duration) -> bool {
  tokio::select! {
    biased;
    _ = shutdown.recv() => false,
    _ = tokio::time::sleep(duration) => true,
  }
}
