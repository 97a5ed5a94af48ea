//! Groups manager binding: one markets manager per DSO.
//!
//! A group is created at most once. `add_group` reads the registry flag
//! first and only submits when the DSO has no group yet.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tracing::info;

use crate::error::ClientError;
use crate::ports::chain_gateway::ChainGateway;

use super::artifact::ContractArtifact;
use super::bindings::{GROUPS_MANAGER_FUNCTIONS, IGroupsManager};
use super::proxy::{ContractProxy, TxOutcome};

/// What `add_group` did.
#[derive(Debug, Clone)]
pub enum GroupRegistration {
    /// No group existed; a creation transaction was attempted.
    Submitted(TxOutcome),
    /// The DSO already had a group at this markets manager address.
    AlreadyRegistered { manager: Address },
}

pub struct GroupRegistry<G: ChainGateway> {
    proxy: ContractProxy<G>,
}

impl<G: ChainGateway> GroupRegistry<G> {
    pub async fn bind(
        gateway: Arc<G>,
        address: Address,
        artifact: &ContractArtifact,
        confirmation_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let proxy = ContractProxy::bind(
            gateway,
            "GroupsManager",
            address,
            artifact,
            GROUPS_MANAGER_FUNCTIONS,
            confirmation_timeout,
        )
        .await?;
        Ok(Self { proxy })
    }

    pub fn address(&self) -> Address {
        self.proxy.address()
    }

    /// Register a group for `dso` unless one exists.
    ///
    /// The existence check is a view and propagates its error; the
    /// creation itself reports through `TxOutcome`.
    pub async fn add_group(&self, owner: Address, dso: Address) -> Result<GroupRegistration, ClientError> {
        if self.get_flag(dso).await? {
            let manager = self.get_address(dso).await?;
            info!(dso = %dso, manager = %manager, "Group already exists");
            return Ok(GroupRegistration::AlreadyRegistered { manager });
        }

        let outcome = self
            .proxy
            .transact(IGroupsManager::addGroupCall { dso }, owner)
            .await;
        Ok(GroupRegistration::Submitted(outcome))
    }

    pub async fn get_flag(&self, dso: Address) -> Result<bool, ClientError> {
        Ok(self
            .proxy
            .view(IGroupsManager::getFlagCall { dso })
            .await?
            .exists)
    }

    /// Markets manager bound to `dso` (zero address when none).
    pub async fn get_address(&self, dso: Address) -> Result<Address, ClientError> {
        Ok(self
            .proxy
            .view(IGroupsManager::getAddressCall { dso })
            .await?
            .manager)
    }
}
