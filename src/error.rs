//! Client Error Taxonomy
//!
//! Every failure the library can report at its seams. Mutation failures
//! are carried inside `TxOutcome::Failed` / `MarketOpening::Failed`;
//! view, binding and usage failures propagate as `Err`.

use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use thiserror::Error;

use crate::domain::market::MarketPhase;

/// Errors raised by the gateway, contract proxies and use cases.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Address could not be normalized to its checksum form.
    #[error("invalid address: {input}")]
    InvalidAddress { input: String },

    /// Artifact missing/malformed or the address holds no usable contract.
    #[error("cannot bind contract {contract}: {reason}")]
    ContractBinding { contract: String, reason: String },

    /// Market type code outside monthly(0) / daily(1) / hourly(2).
    #[error("unsupported market type {0}")]
    UnsupportedMarketType(u8),

    /// Account index outside the node's account list.
    #[error("account index {index} out of range ({available} accounts available)")]
    InvalidAccountIndex { index: usize, available: usize },

    /// Transaction not included within the confirmation window.
    #[error("transaction {tx_hash} not mined within {timeout:?}")]
    TransactionTimeout { tx_hash: TxHash, timeout: Duration },

    /// Execution failed, either at estimation or in the mined receipt.
    #[error("transaction reverted{}: {reason}", .tx_hash.map(|h| format!(" ({h})")).unwrap_or_default())]
    TransactionReverted {
        tx_hash: Option<TxHash>,
        reason: String,
    },

    /// Read-only call failed or returned undecodable data.
    #[error("view call {call} failed: {reason}")]
    ViewCallFailure { call: String, reason: String },

    /// Transport-level failure talking to the node.
    #[error("rpc failure: {0}")]
    Rpc(String),

    /// Lifecycle step requested in the wrong phase.
    #[error("market {idx} is {phase}, cannot {attempted}")]
    OutOfSequence {
        idx: U256,
        phase: MarketPhase,
        attempted: &'static str,
    },

    /// Malformed command-line operation.
    #[error("invalid command {command}: {reason}")]
    InvalidCommand { command: String, reason: String },

    /// Command abandoned on an interrupt signal.
    #[error("interrupted")]
    Interrupted,
}

impl ClientError {
    /// Process exit code for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidCommand { .. }
            | Self::InvalidAccountIndex { .. }
            | Self::InvalidAddress { .. } => 2,
            Self::ContractBinding { .. } => 3,
            Self::ViewCallFailure { .. } | Self::Rpc(_) => 4,
            Self::TransactionTimeout { .. } | Self::TransactionReverted { .. } => 5,
            Self::OutOfSequence { .. } | Self::UnsupportedMarketType(_) => 6,
            Self::Interrupted => 130,
        }
    }

    pub(crate) fn binding(contract: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContractBinding {
            contract: contract.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn view(call: impl Into<String>, reason: impl ToString) -> Self {
        Self::ViewCallFailure {
            call: call.into(),
            reason: reason.to_string(),
        }
    }
}
