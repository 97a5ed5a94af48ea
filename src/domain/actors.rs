//! Actors and account resolution.
//!
//! The node exposes a fixed, ordered list of managed accounts. Roles
//! (owner, DSO, player, referee) are picked from it by index once at
//! startup and never change for the lifetime of the process.

use std::str::FromStr;

use alloy::primitives::Address;

use crate::error::ClientError;

/// Parse an address and normalize it to its checksummed form.
///
/// All-lowercase and all-uppercase hex is accepted as-is; mixed-case input
/// must carry a valid EIP-55 checksum.
pub fn normalize_address(raw: &str) -> Result<Address, ClientError> {
    let trimmed = raw.trim();
    let invalid = || ClientError::InvalidAddress {
        input: raw.to_string(),
    };

    let address = Address::from_str(trimmed).map_err(|_| invalid())?;

    let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let checksummed = address.to_checksum(None);
        if checksummed.strip_prefix("0x") != Some(hex) {
            return Err(invalid());
        }
    }

    Ok(address)
}

/// The accounts made available by the chain-access layer.
#[derive(Debug, Clone, Default)]
pub struct AccountBook {
    accounts: Vec<Address>,
}

impl AccountBook {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self { accounts }
    }

    /// Resolve an account index, failing instead of guessing.
    pub fn resolve(&self, index: usize) -> Result<Address, ClientError> {
        self.accounts
            .get(index)
            .copied()
            .ok_or(ClientError::InvalidAccountIndex {
                index,
                available: self.accounts.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Account indices for each role, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleIndices {
    pub owner: usize,
    pub dso: usize,
    pub player: usize,
    pub referee: usize,
}

/// Resolved wallet addresses of every role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actors {
    /// Token owner / minter and group registry owner.
    pub owner: Address,
    /// Distribution system operator: opens and settles markets.
    pub dso: Address,
    /// Confirms openings and settlements.
    pub player: Address,
    pub referee: Address,
}

impl Actors {
    pub fn resolve(book: &AccountBook, roles: RoleIndices) -> Result<Self, ClientError> {
        Ok(Self {
            owner: book.resolve(roles.owner)?,
            dso: book.resolve(roles.dso)?,
            player: book.resolve(roles.player)?,
            referee: book.resolve(roles.referee)?,
        })
    }
}
