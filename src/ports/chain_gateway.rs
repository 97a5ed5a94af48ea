//! Chain Gateway Port - Ledger Access Interface
//!
//! Defines the trait the contract proxies use to reach the ledger:
//! account listing, fee estimation, transaction submission, inclusion
//! wait and read-only calls. The ledger is a black box behind it.
//!
//! Addresses crossing this boundary are typed `Address` values, which
//! only exist once normalized (see `domain::actors::normalize_address`).

use std::time::Duration;

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::error::ClientError;

/// Confirmation window applied when nothing else is configured.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// An encoded contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
  /// Target contract.
  pub to: Address,
  /// ABI-encoded calldata (selector + arguments).
  pub input: Bytes,
  /// Solidity signature, for logs.
  pub method: &'static str,
}

/// Fee parameters attached to a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBound {
  /// Gas limit, from estimation.
  pub gas_limit: u64,
  /// Legacy gas price in wei.
  pub gas_price: u128,
}

/// Inclusion proof for a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
  pub tx_hash: TxHash,
  pub block_number: u64,
}

/// Trait for ledger access.
///
/// Calls are independent and stateless between invocations; a single
/// implementation is reused sequentially for the whole process.
#[async_trait]
pub trait ChainGateway: Send + Sync + 'static {
  /// Accounts managed by the node, in node order.
  async fn accounts(&self) -> Result<Vec<Address>, ClientError>;

  /// Whether deployed code exists at `address`.
  async fn has_code(&self, address: Address) -> Result<bool, ClientError>;

  /// Estimate the gas bound and gas price for `call` sent by `sender`.
  ///
  /// # Errors
  /// `TransactionReverted` if the call would revert.
  async fn estimate_fee(&self, call: &ContractCall, sender: Address) -> Result<FeeBound, ClientError>;

  /// Submit `call` from `sender` and return its hash without waiting.
  async fn submit_transaction(
    &self,
    call: &ContractCall,
    sender: Address,
    fee: FeeBound,
  ) -> Result<TxHash, ClientError>;

  /// Block until `tx_hash` is mined.
  ///
  /// # Errors
  /// `TransactionTimeout` past `timeout`, `TransactionReverted` on a
  /// failed receipt.
  async fn await_confirmation(&self, tx_hash: TxHash, timeout: Duration) -> Result<TxReceipt, ClientError>;

  /// Execute a read-only call. No confirmation wait.
  async fn call_view(&self, call: &ContractCall) -> Result<Bytes, ClientError>;
}
