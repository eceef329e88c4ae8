use std::collections::BTreeMap;
use std::fmt;

use govern_types::{Address, OwnerGuard};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RegistryError;

/// Logical roles the registry resolves to component addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    TokenIssuer,
    CharityManager,
    Voter,
    Treasury,
    AssetList,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::TokenIssuer,
        Role::CharityManager,
        Role::Voter,
        Role::Treasury,
        Role::AssetList,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TokenIssuer => "token_issuer",
            Self::CharityManager => "charity_manager",
            Self::Voter => "voter",
            Self::Treasury => "treasury",
            Self::AssetList => "asset_list",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Addresses handed to [`AddressRegistry::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignments {
    pub token_issuer: Address,
    pub charity_manager: Address,
    pub voter: Address,
    pub treasury: Address,
    pub asset_list: Address,
}

impl RoleAssignments {
    fn pairs(&self) -> [(Role, Address); 5] {
        [
            (Role::TokenIssuer, self.token_issuer),
            (Role::CharityManager, self.charity_manager),
            (Role::Voter, self.voter),
            (Role::Treasury, self.treasury),
            (Role::AssetList, self.asset_list),
        ]
    }
}

/// Emitted whenever a role is (re)assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssigned {
    pub role: Role,
    pub address: Address,
}

/// Owner-controlled directory from roles to addresses.
///
/// Initialized exactly once; afterwards individual roles may be reassigned by
/// the owner. Reads are unrestricted.
#[derive(Clone, Debug)]
pub struct AddressRegistry {
    guard: OwnerGuard,
    entries: BTreeMap<Role, Address>,
    initialized: bool,
}

impl AddressRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            guard: OwnerGuard::new(owner),
            entries: BTreeMap::new(),
            initialized: false,
        }
    }

    pub fn owner(&self) -> Address {
        self.guard.owner()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// One-time wiring of every role.
    pub fn init(
        &mut self,
        caller: &Address,
        assignments: RoleAssignments,
    ) -> Result<Vec<RoleAssigned>, RegistryError> {
        self.guard.ensure_owner(caller)?;
        if self.initialized {
            return Err(RegistryError::AlreadyInitialized);
        }
        let pairs = assignments.pairs();
        if let Some((role, _)) = pairs.iter().find(|(_, address)| address.is_zero()) {
            return Err(RegistryError::ZeroAddress(*role));
        }

        self.initialized = true;
        let events = pairs
            .iter()
            .map(|(role, address)| {
                self.entries.insert(*role, *address);
                RoleAssigned {
                    role: *role,
                    address: *address,
                }
            })
            .collect();

        info!(owner = %self.guard.owner(), "Address registry initialized");
        Ok(events)
    }

    /// Reassign a single role.
    pub fn set(
        &mut self,
        caller: &Address,
        role: Role,
        address: Address,
    ) -> Result<RoleAssigned, RegistryError> {
        self.guard.ensure_owner(caller)?;
        if address.is_zero() {
            return Err(RegistryError::ZeroAddress(role));
        }
        let previous = self.entries.insert(role, address);
        info!(
            role = %role,
            address = %address,
            previous = ?previous,
            "Registry role assigned"
        );
        Ok(RoleAssigned { role, address })
    }

    pub fn get(&self, role: Role) -> Option<Address> {
        self.entries.get(&role).copied()
    }

    pub fn token_issuer(&self) -> Option<Address> {
        self.get(Role::TokenIssuer)
    }

    pub fn charity_manager(&self) -> Option<Address> {
        self.get(Role::CharityManager)
    }

    pub fn voter(&self) -> Option<Address> {
        self.get(Role::Voter)
    }

    pub fn treasury(&self) -> Option<Address> {
        self.get(Role::Treasury)
    }

    pub fn asset_list(&self) -> Option<Address> {
        self.get(Role::AssetList)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        Ok(self.guard.transfer_ownership(caller, new_owner)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployer() -> Address {
        Address::derive("deployer")
    }

    fn assignments() -> RoleAssignments {
        RoleAssignments {
            token_issuer: Address::derive("token"),
            charity_manager: Address::derive("charity"),
            voter: Address::derive("voting"),
            treasury: Address::derive("treasury"),
            asset_list: Address::derive("assets"),
        }
    }

    #[test]
    fn init_assigns_every_role_once() {
        let mut registry = AddressRegistry::new(deployer());
        let events = registry.init(&deployer(), assignments()).unwrap();
        assert_eq!(events.len(), Role::ALL.len());
        assert_eq!(registry.charity_manager(), Some(Address::derive("charity")));
        assert_eq!(registry.voter(), Some(Address::derive("voting")));

        assert_eq!(
            registry.init(&deployer(), assignments()),
            Err(RegistryError::AlreadyInitialized)
        );
    }

    #[test]
    fn owner_can_reassign_treasury() {
        let mut registry = AddressRegistry::new(deployer());
        registry.init(&deployer(), assignments()).unwrap();

        let replacement = Address::derive("treasury-v2");
        registry.set(&deployer(), Role::Treasury, replacement).unwrap();
        assert_eq!(registry.treasury(), Some(replacement));

        registry
            .set(&deployer(), Role::Treasury, Address::derive("treasury"))
            .unwrap();
        assert_eq!(registry.treasury(), Some(Address::derive("treasury")));
    }

    #[test]
    fn non_owner_cannot_reassign() {
        let mut registry = AddressRegistry::new(deployer());
        registry.init(&deployer(), assignments()).unwrap();

        let err = registry
            .set(&Address::derive("user"), Role::Treasury, Address::derive("evil"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized(_)));
        assert_eq!(registry.treasury(), Some(Address::derive("treasury")));
    }

    #[test]
    fn non_owner_cannot_init() {
        let mut registry = AddressRegistry::new(deployer());
        assert!(matches!(
            registry.init(&Address::derive("user"), assignments()),
            Err(RegistryError::Unauthorized(_))
        ));
        assert!(!registry.is_initialized());
        assert_eq!(registry.treasury(), None);
    }

    #[test]
    fn zero_address_rejected() {
        let mut registry = AddressRegistry::new(deployer());
        let mut bad = assignments();
        bad.voter = Address::ZERO;
        assert_eq!(
            registry.init(&deployer(), bad),
            Err(RegistryError::ZeroAddress(Role::Voter))
        );
        assert!(!registry.is_initialized());
    }
}
