//! Contract Bindings - Typed Proxies over the Chain Gateway
//!
//! One binding per deployed contract, each validated against its build
//! artifact at construction and driving every mutation through the same
//! submit → wait → log protocol (`ContractProxy`).
//!
//! Bindings:
//! - `TokenContract`: NGT minting, allowances, balances
//! - `GroupRegistry`: DSO → markets manager registration
//! - `MarketsManager`: market open / confirm / settle and getters

pub mod artifact;
pub mod bindings;
pub mod groups;
pub mod markets;
pub mod proxy;
pub mod token;

pub use artifact::{ArtifactDir, ContractArtifact};
pub use groups::{GroupRegistration, GroupRegistry};
pub use markets::{MarketsManager, OpenRequest};
pub use proxy::{ContractProxy, TxOutcome};
pub use token::TokenContract;
