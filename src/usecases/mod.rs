//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates the contract bindings and domain logic into the
//! client's workflows. Each use case is a self-contained operation.
//!
//! Use cases:
//! - `MarketLifecycle`: open / confirm / settle / confirm settlement
//! - `Simulation`: continuous market cycles until shutdown
//! - `Bootstrap`: PREPARE (group, minting, allowances)
//! - `CommandDispatcher`: operation mode parsing and dispatch

pub mod bootstrap;
pub mod commands;
pub mod market_lifecycle;
pub mod simulation;

pub use bootstrap::{Bootstrap, PrepareReport};
pub use commands::{Command, CommandDispatcher, CommandOutcome};
pub use market_lifecycle::{CALC_IDX_MARKET_TYPE, MarketLifecycle, MarketOpening};
pub use simulation::{Pacing, PowerPeakSampler, Simulation, SimulationSummary};
