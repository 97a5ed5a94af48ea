//! Inclusion Wait - Receipt Polling with a Hard Deadline
//!
//! Polls for a receipt until it appears or the confirmation window
//! closes. Transport errors while polling are logged and polled through;
//! only the deadline ends the wait without a receipt.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::TxHash;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::ports::chain_gateway::TxReceipt;

/// What a fetched receipt says about inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionStatus {
    pub success: bool,
    pub block_number: u64,
}

/// Poll `fetch` every `poll_interval` until the transaction is mined.
///
/// `fetch` returns `Ok(None)` while the transaction is pending.
///
/// # Errors
/// - `TransactionTimeout` when nothing is mined within `timeout`
/// - `TransactionReverted` when the receipt reports failure
pub async fn wait_for_inclusion<F, Fut>(
    tx_hash: TxHash,
    timeout: Duration,
    poll_interval: Duration,
    mut fetch: F,
) -> Result<TxReceipt, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<InclusionStatus>, ClientError>>,
{
    let poll = async {
        loop {
            match fetch().await {
                Ok(Some(status)) if status.success => {
                    return Ok(TxReceipt {
                        tx_hash,
                        block_number: status.block_number,
                    });
                }
                Ok(Some(status)) => {
                    return Err(ClientError::TransactionReverted {
                        tx_hash: Some(tx_hash),
                        reason: format!("receipt status failed in block {}", status.block_number),
                    });
                }
                Ok(None) => debug!(tx_hash = %tx_hash, "Transaction pending"),
                Err(e) => warn!(tx_hash = %tx_hash, error = %e, "Receipt lookup failed, retrying"),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| ClientError::TransactionTimeout { tx_hash, timeout })?
}
