//! Bootstrap Use Case - PREPARE
//!
//! Composite setup before a simulation can run:
//! 1. Register the DSO's group unless it exists
//! 2. Look up the DSO's markets manager
//! 3. Mint the configured amounts to DSO, player and referee
//! 4. Grant the configured allowances from DSO and player to the
//!    markets manager
//!
//! Failed mints or allowances are counted and reported; the remaining
//! steps still run. A group that could not be created stops the
//! sequence, since there is no markets manager to grant allowances to.

use alloy::primitives::{Address, U256};
use tracing::{info, instrument, warn};

use crate::config::TokensConfig;
use crate::contracts::groups::{GroupRegistration, GroupRegistry};
use crate::contracts::proxy::TxOutcome;
use crate::contracts::token::TokenContract;
use crate::domain::actors::Actors;
use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;

/// What PREPARE achieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareReport {
  /// The DSO's markets manager; `None` when the group is unavailable.
  pub markets_manager: Option<Address>,
  /// Transactions that did not happen.
  pub failed_transactions: usize,
}

pub struct Bootstrap<'a, G: ChainGateway> {
  token: &'a TokenContract<G>,
  groups: &'a GroupRegistry<G>,
  actors: &'a Actors,
  tokens: &'a TokensConfig,
}

impl<'a, G: ChainGateway> Bootstrap<'a, G> {
  pub fn new(
    token: &'a TokenContract<G>,
    groups: &'a GroupRegistry<G>,
    actors: &'a Actors,
    tokens: &'a TokensConfig,
  ) -> Self {
    Self {
      token,
      groups,
      actors,
      tokens,
    }
  }

  /// Run the whole sequence.
  ///
  /// # Errors
  /// Any failed view read (group flag/address lookup).
  #[instrument(skip_all, fields(dso = %self.actors.dso))]
  pub async fn prepare(&self) -> Result<PrepareReport, ClientError> {
    let registration = self.groups.add_group(self.actors.owner, self.actors.dso).await?;
    if let GroupRegistration::Submitted(TxOutcome::Failed(e)) = &registration {
      warn!(error = %e, "Unable to create group, bootstrap stopped");
      return Ok(PrepareReport {
        markets_manager: None,
        failed_transactions: 1,
      });
    }

    let markets_manager = self.groups.get_address(self.actors.dso).await?;
    info!(markets_manager = %markets_manager, "Group available");

    let minting = self.tokens.minting;
    let allowance = self.tokens.allowance;
    let mut failed = 0;

    info!("Mint");
    for (beneficiary, amount) in [
      (self.actors.dso, minting.dso),
      (self.actors.player, minting.player),
      (self.actors.referee, minting.referee),
    ] {
      let outcome = self
        .token
        .mint(self.actors.owner, beneficiary, U256::from(amount))
        .await;
      failed += usize::from(!outcome.is_confirmed());
    }

    info!("Set allowance");
    for (owner, amount) in [
      (self.actors.dso, allowance.dso_to_market),
      (self.actors.player, allowance.player_to_market),
    ] {
      let outcome = self
        .token
        .increase_allowance(owner, markets_manager, U256::from(amount))
        .await;
      failed += usize::from(!outcome.is_confirmed());
    }

    info!(failed_transactions = failed, "Bootstrap finished");
    Ok(PrepareReport {
      markets_manager: Some(markets_manager),
      failed_transactions: failed,
    })
  }
}
