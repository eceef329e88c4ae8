use std::collections::BTreeSet;

use govern_types::{Address, AssetDirectory, AssetId, OwnerGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RegistryError;

/// Emitted the first time an asset is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAccepted {
    pub asset: AssetId,
}

/// Owner-maintained set of assets the treasury accepts. Append-only.
#[derive(Clone, Debug)]
pub struct AssetRegistry {
    guard: OwnerGuard,
    accepted: BTreeSet<AssetId>,
}

impl AssetRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            guard: OwnerGuard::new(owner),
            accepted: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.guard.owner()
    }

    /// Accept `asset`. Re-adding is a no-op and returns `None`.
    pub fn add(
        &mut self,
        caller: &Address,
        asset: AssetId,
    ) -> Result<Option<AssetAccepted>, RegistryError> {
        self.guard.ensure_owner(caller)?;
        if !self.accepted.insert(asset) {
            debug!(asset = %asset, "Asset already accepted");
            return Ok(None);
        }
        info!(asset = %asset, "Asset accepted");
        Ok(Some(AssetAccepted { asset }))
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.accepted.iter()
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

impl AssetDirectory for AssetRegistry {
    fn contains(&self, asset: &AssetId) -> bool {
        self.accepted.contains(asset)
    }
}
