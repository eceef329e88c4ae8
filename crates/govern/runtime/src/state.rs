use govern_registry::{
    AddressRegistry, AssetRegistry, CharityRegistry, CreditToken, PriceOracle, RoleAssignments,
    TokenBank,
};
use govern_treasury::TreasuryEngine;
use govern_types::Address;
use govern_voting::ProposalMachine;
use serde::{Deserialize, Serialize};

use crate::config::GovernanceConfig;
use crate::substrate::NativeBank;

/// Addresses the deployment assigns to each component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAddresses {
    pub registry: Address,
    pub credit: Address,
    pub charity: Address,
    pub voting: Address,
    pub treasury: Address,
    pub assets: Address,
    pub oracle: Address,
}

impl ComponentAddresses {
    /// Deterministic addresses derived from the deployer.
    pub fn derive(deployer: &Address) -> Self {
        let at = |component: &str| Address::derive(&format!("{}/{}", deployer, component));
        Self {
            registry: at("registry"),
            credit: at("credit"),
            charity: at("charity"),
            voting: at("voting"),
            treasury: at("treasury"),
            assets: at("assets"),
            oracle: at("oracle"),
        }
    }

    /// Role wiring for `AddressRegistry::init`.
    pub fn role_assignments(&self) -> RoleAssignments {
        RoleAssignments {
            token_issuer: self.credit,
            charity_manager: self.charity,
            voter: self.voting,
            treasury: self.treasury,
            asset_list: self.assets,
        }
    }
}

/// Everything a call may touch. Cloned as the rollback snapshot.
#[derive(Clone, Debug)]
pub struct LedgerState {
    pub(crate) registry: AddressRegistry,
    pub(crate) assets: AssetRegistry,
    pub(crate) oracle: PriceOracle,
    pub(crate) charity: CharityRegistry,
    pub(crate) credit: CreditToken,
    pub(crate) tokens: TokenBank,
    pub(crate) native: NativeBank,
    pub(crate) treasury: TreasuryEngine,
    pub(crate) voting: ProposalMachine,
}

impl LedgerState {
    pub(crate) fn new(config: &GovernanceConfig, owner: Address, addresses: &ComponentAddresses) -> Self {
        Self {
            registry: AddressRegistry::new(owner),
            assets: AssetRegistry::new(owner),
            oracle: PriceOracle::new(owner),
            charity: CharityRegistry::new(owner),
            credit: CreditToken::new(
                config.treasury.credit_name.clone(),
                config.treasury.credit_symbol.clone(),
            ),
            tokens: TokenBank::new(owner),
            native: NativeBank::new(),
            treasury: TreasuryEngine::new(addresses.treasury),
            voting: ProposalMachine::new(config.voting.machine_params()),
        }
    }

    pub fn registry(&self) -> &AddressRegistry {
        &self.registry
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn oracle(&self) -> &PriceOracle {
        &self.oracle
    }

    pub fn charity(&self) -> &CharityRegistry {
        &self.charity
    }

    pub fn credit(&self) -> &CreditToken {
        &self.credit
    }

    pub fn tokens(&self) -> &TokenBank {
        &self.tokens
    }

    pub fn native(&self) -> &NativeBank {
        &self.native
    }

    pub fn treasury(&self) -> &TreasuryEngine {
        &self.treasury
    }

    pub fn voting(&self) -> &ProposalMachine {
        &self.voting
    }
}
