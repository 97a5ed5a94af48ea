//! Chain Adapters - Ledger Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - Node connection over HTTP or IPC with a chain id check
//! - Fee bound estimation (gas limit + legacy gas price)
//! - Receipt polling under a confirmation timeout
//! - The `ChainGateway` implementation the contract proxies use

pub mod confirmation;
pub mod gas;
pub mod gateway;
pub mod provider;

pub use gas::GasOracle;
pub use gateway::AlloyGateway;
pub use provider::ChainProvider;
