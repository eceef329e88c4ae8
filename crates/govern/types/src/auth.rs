use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::address::Address;
use crate::error::AuthorizationError;

/// Owner-gated authorization guard.
///
/// Every collaborator with owner-only entry points embeds one of these and
/// calls [`OwnerGuard::ensure_owner`] before touching its own state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerGuard {
    owner: Address,
}

impl OwnerGuard {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), AuthorizationError> {
        if self.is_owner(caller) {
            return Ok(());
        }
        warn!(caller = %caller, owner = %self.owner, "Owner-only call rejected");
        Err(AuthorizationError {
            caller: *caller,
            owner: self.owner,
        })
    }

    /// Hand ownership to `new_owner`. Only the current owner may do this.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), AuthorizationError> {
        self.ensure_owner(caller)?;
        info!(from = %self.owner, to = %new_owner, "Ownership transferred");
        self.owner = new_owner;
        Ok(())
    }
}
