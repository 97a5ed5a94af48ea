//! Command Dispatcher - Operation Mode Handling
//!
//! An operation mode is a command token followed by comma-separated
//! arguments, e.g. `MINT,1,100` or `ALLOW,2,0x...,500`. It is parsed into
//! a typed `Command` up front, then dispatched against the bound token
//! and group registry, or into the market simulation for `SIM`.
//!
//! Unknown tokens are logged and ignored.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::contracts::artifact::ArtifactDir;
use crate::contracts::groups::{GroupRegistration, GroupRegistry};
use crate::contracts::markets::MarketsManager;
use crate::contracts::proxy::TxOutcome;
use crate::contracts::token::TokenContract;
use crate::domain::actors::{AccountBook, Actors, normalize_address};
use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;
use crate::ports::clock::{Clock, SystemClock};

use super::bootstrap::Bootstrap;
use super::market_lifecycle::MarketLifecycle;
use super::simulation::{Pacing, PowerPeakSampler, Simulation, SimulationSummary};

/// A parsed operation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Mint `amount` tokens to an account.
  Mint { account: usize, amount: U256 },
  /// Token balance of an account.
  Balance { account: usize },
  /// Token balance of a raw address.
  BalanceAddr { address: Address },
  /// Allowance granted by an account to a raw address.
  Allowance { owner: usize, spender: Address },
  /// Markets manager bound to a DSO account.
  AddrMarketsManager { dso: usize },
  /// Raise the allowance an account grants to a raw address.
  Allow {
    owner: usize,
    spender: Address,
    amount: U256,
  },
  /// Register a group for a DSO account unless one exists.
  AddGroup { owner: usize, dso: usize },
  /// Group, minting and allowances from configuration.
  Prepare,
  /// Continuous market simulation.
  Sim,
  /// Anything else; ignored.
  Unknown(String),
}

impl Command {
  /// Parse `TOKEN[,arg...]`.
  ///
  /// # Errors
  /// `InvalidCommand` for a known token with missing, extra or
  /// non-numeric arguments; `InvalidAddress` for a malformed address.
  pub fn parse(raw: &str) -> Result<Self, ClientError> {
    let mut parts = raw.split(',').map(str::trim);
    let token = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();
    let args = Args { raw, args: &args };

    let command = match token {
      "MINT" => {
        args.arity(2)?;
        Self::Mint {
          account: args.index(0)?,
          amount: args.amount(1)?,
        }
      }
      "BALANCE" => {
        args.arity(1)?;
        Self::Balance {
          account: args.index(0)?,
        }
      }
      "BALANCE_ADDR" => {
        args.arity(1)?;
        Self::BalanceAddr {
          address: args.address(0)?,
        }
      }
      "ALLOWANCE" => {
        args.arity(2)?;
        Self::Allowance {
          owner: args.index(0)?,
          spender: args.address(1)?,
        }
      }
      "ADDR_MARKETS_MANAGER" => {
        args.arity(1)?;
        Self::AddrMarketsManager { dso: args.index(0)? }
      }
      "ALLOW" => {
        args.arity(3)?;
        Self::Allow {
          owner: args.index(0)?,
          spender: args.address(1)?,
          amount: args.amount(2)?,
        }
      }
      "ADD_GROUP" => {
        args.arity(2)?;
        Self::AddGroup {
          owner: args.index(0)?,
          dso: args.index(1)?,
        }
      }
      "PREPARE" => {
        args.arity(0)?;
        Self::Prepare
      }
      "SIM" => {
        args.arity(0)?;
        Self::Sim
      }
      "" => {
        return Err(ClientError::InvalidCommand {
          command: raw.to_string(),
          reason: "empty operation mode".into(),
        });
      }
      _ => Self::Unknown(raw.to_string()),
    };
    Ok(command)
  }
}

impl FromStr for Command {
  type Err = ClientError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

struct Args<'a> {
  raw: &'a str,
  args: &'a [&'a str],
}

impl Args<'_> {
  fn invalid(&self, reason: String) -> ClientError {
    ClientError::InvalidCommand {
      command: self.raw.to_string(),
      reason,
    }
  }

  fn arity(&self, count: usize) -> Result<(), ClientError> {
    if self.args.len() == count {
      Ok(())
    } else {
      Err(self.invalid(format!("expected {count} argument(s), got {}", self.args.len())))
    }
  }

  fn index(&self, pos: usize) -> Result<usize, ClientError> {
    self.args[pos]
      .parse()
      .map_err(|_| self.invalid(format!("argument {} is not an account index: {:?}", pos + 1, self.args[pos])))
  }

  fn amount(&self, pos: usize) -> Result<U256, ClientError> {
    U256::from_str_radix(self.args[pos], 10)
      .map_err(|_| self.invalid(format!("argument {} is not an amount: {:?}", pos + 1, self.args[pos])))
  }

  fn address(&self, pos: usize) -> Result<Address, ClientError> {
    normalize_address(self.args[pos])
  }
}

/// How a dispatched command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
  /// Every transaction mined, or a read completed.
  Completed,
  /// Unknown command; nothing done.
  Ignored,
  /// This many transactions did not happen.
  TransactionsFailed(usize),
  /// The simulation was stopped by the shutdown signal.
  SimulationStopped(SimulationSummary),
}

impl CommandOutcome {
  fn from_failures(failed: usize) -> Self {
    if failed == 0 {
      Self::Completed
    } else {
      Self::TransactionsFailed(failed)
    }
  }

  fn from_outcome(outcome: &TxOutcome) -> Self {
    Self::from_failures(usize::from(!outcome.is_confirmed()))
  }

  /// Process exit code (0 on success).
  pub fn exit_code(&self) -> u8 {
    match self {
      Self::Completed | Self::Ignored | Self::SimulationStopped(_) => 0,
      Self::TransactionsFailed(_) => 5,
    }
  }
}

/// Runs commands against the bound contracts.
pub struct CommandDispatcher<G: ChainGateway, K: Clock + Clone = SystemClock> {
  gateway: Arc<G>,
  book: AccountBook,
  actors: Actors,
  token: TokenContract<G>,
  groups: GroupRegistry<G>,
  config: AppConfig,
  clock: K,
  sampler_seed: Option<u64>,
}

impl<G: ChainGateway, K: Clock + Clone> CommandDispatcher<G, K> {
  /// Resolve the actors and bind the token and group registry.
  ///
  /// # Errors
  /// `InvalidAccountIndex` for a role outside the node's accounts,
  /// `ContractBinding` for a bad artifact or address, `Rpc` when the
  /// account list cannot be read.
  #[instrument(skip_all)]
  pub async fn from_config(gateway: Arc<G>, config: AppConfig, clock: K) -> Result<Self, ClientError> {
    let book = AccountBook::new(gateway.accounts().await?);
    let actors = Actors::resolve(&book, config.wallets.roles())?;
    info!(
      accounts = book.len(),
      owner = %actors.owner,
      dso = %actors.dso,
      player = %actors.player,
      referee = %actors.referee,
      "Actors resolved"
    );

    let contracts = &config.contracts;
    let artifacts = ArtifactDir::for_project(&contracts.project_dir);
    let timeout = config.provider.confirmation_timeout();

    let token = TokenContract::bind(
      Arc::clone(&gateway),
      contracts.ngt.address()?,
      &artifacts.load("NGT", &contracts.ngt.file_name)?,
      timeout,
    )
    .await?;

    let groups = GroupRegistry::bind(
      Arc::clone(&gateway),
      contracts.groups_manager.address()?,
      &artifacts.load("GroupsManager", &contracts.groups_manager.file_name)?,
      timeout,
    )
    .await?;
    info!(ngt = %token.address(), groups_manager = %groups.address(), "Contracts ready");

    Ok(Self {
      gateway,
      book,
      actors,
      token,
      groups,
      config,
      clock,
      sampler_seed: None,
    })
  }

  /// Draw simulated power peaks from a fixed seed.
  pub fn with_sampler_seed(mut self, seed: u64) -> Self {
    self.sampler_seed = Some(seed);
    self
  }

  pub fn actors(&self) -> &Actors {
    &self.actors
  }

  pub fn token(&self) -> &TokenContract<G> {
    &self.token
  }

  pub fn groups(&self) -> &GroupRegistry<G> {
    &self.groups
  }

  /// Run `command`. `shutdown` only matters for `SIM`.
  ///
  /// # Errors
  /// Usage errors, view failures and binding failures propagate; failed
  /// transactions are reported through `CommandOutcome`.
  #[instrument(skip(self, shutdown))]
  pub async fn dispatch(
    &self,
    command: Command,
    shutdown: broadcast::Receiver<()>,
  ) -> Result<CommandOutcome, ClientError> {
    match command {
      Command::Mint { account, amount } => {
        let beneficiary = self.book.resolve(account)?;
        let outcome = self.token.mint(self.actors.owner, beneficiary, amount).await;
        let balance = self.token.balance_of(beneficiary).await?;
        match outcome.error() {
          None => info!(beneficiary = %beneficiary, amount = %amount, balance = %balance, "Minted NGT"),
          Some(e) => warn!(beneficiary = %beneficiary, balance = %balance, error = %e, "Mint failed"),
        }
        Ok(CommandOutcome::from_outcome(&outcome))
      }
      Command::Balance { account } => {
        let address = self.book.resolve(account)?;
        self.log_balance(address).await?;
        Ok(CommandOutcome::Completed)
      }
      Command::BalanceAddr { address } => {
        self.log_balance(address).await?;
        Ok(CommandOutcome::Completed)
      }
      Command::Allowance { owner, spender } => {
        let owner = self.book.resolve(owner)?;
        let allowance = self.token.allowance(owner, spender).await?;
        info!(owner = %owner, spender = %spender, allowance = %allowance, "Allowance");
        Ok(CommandOutcome::Completed)
      }
      Command::AddrMarketsManager { dso } => {
        let dso = self.book.resolve(dso)?;
        let manager = self.groups.get_address(dso).await?;
        info!(dso = %dso, markets_manager = %manager, "Markets manager address");
        Ok(CommandOutcome::Completed)
      }
      Command::Allow {
        owner,
        spender,
        amount,
      } => {
        let owner = self.book.resolve(owner)?;
        let outcome = self.token.increase_allowance(owner, spender, amount).await;
        let allowance = self.token.allowance(owner, spender).await?;
        match outcome.error() {
          None => info!(owner = %owner, spender = %spender, allowance = %allowance, "Allowance set"),
          Some(e) => warn!(owner = %owner, spender = %spender, allowance = %allowance, error = %e, "Allowance not raised"),
        }
        Ok(CommandOutcome::from_outcome(&outcome))
      }
      Command::AddGroup { owner, dso } => {
        let owner = self.book.resolve(owner)?;
        let dso = self.book.resolve(dso)?;
        let registration = self.groups.add_group(owner, dso).await?;
        if let GroupRegistration::Submitted(TxOutcome::Failed(e)) = &registration {
          warn!(dso = %dso, error = %e, "Group not created");
          return Ok(CommandOutcome::TransactionsFailed(1));
        }
        let manager = self.groups.get_address(dso).await?;
        info!(dso = %dso, markets_manager = %manager, "Group available");
        Ok(CommandOutcome::Completed)
      }
      Command::Prepare => {
        let report = Bootstrap::new(&self.token, &self.groups, &self.actors, &self.config.tokens)
          .prepare()
          .await?;
        Ok(CommandOutcome::from_failures(report.failed_transactions))
      }
      Command::Sim => self.simulate(shutdown).await,
      Command::Unknown(raw) => {
        warn!(command = %raw, "Command is not available");
        Ok(CommandOutcome::Ignored)
      }
    }
  }

  /// Run `command` until it finishes or `interrupts` delivers a signal.
  ///
  /// For `SIM` the first interrupt is a graceful stop: the simulation
  /// ends at its next wait. Any other interrupt abandons the command,
  /// dropping whatever transaction wait is in flight. A closed
  /// `interrupts` channel lets the command run to completion.
  ///
  /// # Errors
  /// `Interrupted` when the command is abandoned; otherwise as `dispatch`.
  pub async fn dispatch_interruptible(
    &self,
    command: Command,
    mut interrupts: mpsc::Receiver<()>,
  ) -> Result<CommandOutcome, ClientError> {
    let graceful = command == Command::Sim;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let run = self.dispatch(command, shutdown_rx);
    tokio::pin!(run);

    let mut listening = true;
    let mut stopping = false;
    loop {
      tokio::select! {
        outcome = &mut run => return outcome,
        received = interrupts.recv(), if listening => match received {
          None => listening = false,
          Some(()) if graceful && !stopping => {
            info!("Interrupt received, simulation stops at its next wait");
            stopping = true;
            let _ = shutdown_tx.send(());
          }
          Some(()) => {
            warn!("Interrupt received, command abandoned");
            return Err(ClientError::Interrupted);
          }
        },
      }
    }
  }

  async fn log_balance(&self, address: Address) -> Result<(), ClientError> {
    let balance = self.token.balance_of(address).await?;
    info!(address = %address, balance = %balance, "NGT balance");
    Ok(())
  }

  /// Bind the DSO's markets manager and run the simulation until stopped.
  async fn simulate(&self, shutdown: broadcast::Receiver<()>) -> Result<CommandOutcome, ClientError> {
    let address = self.groups.get_address(self.actors.dso).await?;
    if address == Address::ZERO {
      return Err(ClientError::binding(
        "MarketsManager",
        format!("no group registered for DSO {}", self.actors.dso),
      ));
    }

    let contracts = &self.config.contracts;
    let artifact = ArtifactDir::for_project(&contracts.project_dir)
      .load("MarketsManager", &contracts.markets_manager.file_name)?;
    let markets = MarketsManager::bind(
      Arc::clone(&self.gateway),
      address,
      &artifact,
      self.config.provider.confirmation_timeout(),
    )
    .await?;
    info!(markets_manager = %markets.address(), dso = %self.actors.dso, "Simulating on markets manager");

    let lifecycle = MarketLifecycle::new(
      markets,
      self.actors,
      self.config.market.clone(),
      self.clock.clone(),
    );

    let simulation = &self.config.simulation;
    let sampler = match self.sampler_seed {
      Some(seed) => PowerPeakSampler::seeded(simulation.min_power, simulation.max_power, seed),
      None => PowerPeakSampler::from_entropy(simulation.min_power, simulation.max_power),
    };

    let summary = Simulation::new(&lifecycle, &self.token, sampler, Pacing::from_config(simulation))
      .run(shutdown)
      .await?;
    Ok(CommandOutcome::SimulationStopped(summary))
  }
}
