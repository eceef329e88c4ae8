use std::collections::HashMap;

use govern_types::{Address, Amount, CreditIssuer, LedgerError, VotingPower};
use tracing::debug;

use crate::address_book::AddressRegistry;

/// Decimal precision of the credit token.
pub const CREDIT_DECIMALS: u8 = 18;

/// Internal credit ledger.
///
/// The ledger itself has no mint entry point; minting goes through a
/// [`RegistryMinter`], which only admits the registry's treasury.
#[derive(Clone, Debug)]
pub struct CreditToken {
    name: String,
    symbol: String,
    balances: HashMap<Address, Amount>,
    total_supply: Amount,
}

impl CreditToken {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            balances: HashMap::new(),
            total_supply: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        CREDIT_DECIMALS
    }

    pub fn balance_of(&self, who: &Address) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Number of addresses holding a non-zero balance.
    pub fn holders(&self) -> usize {
        self.balances.values().filter(|b| **b > 0).count()
    }

    fn check_credit(&self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.total_supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow("credit total supply".into()))?;
        self.balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("credit balance of {}", to)))?;
        Ok(())
    }

    fn credit(&mut self, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_credit(to, amount)?;
        self.total_supply += amount;
        *self.balances.entry(*to).or_insert(0) += amount;
        debug!(to = %to, amount = amount, supply = self.total_supply, "Credit minted");
        Ok(())
    }
}

impl VotingPower for CreditToken {
    fn voting_power(&self, who: &Address) -> Amount {
        self.balance_of(who)
    }
}

/// Mint capability that admits only the address the registry names as treasury.
pub struct RegistryMinter<'a> {
    token: &'a mut CreditToken,
    registry: &'a AddressRegistry,
}

impl<'a> RegistryMinter<'a> {
    pub fn new(token: &'a mut CreditToken, registry: &'a AddressRegistry) -> Self {
        Self { token, registry }
    }
}

impl CreditIssuer for RegistryMinter<'_> {
    fn check_mint(&self, minter: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if self.registry.treasury() != Some(*minter) {
            return Err(LedgerError::MinterNotAuthorized { minter: *minter });
        }
        self.token.check_credit(to, amount)
    }

    fn mint(&mut self, minter: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.check_mint(minter, to, amount)?;
        self.token.credit(to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_book::RoleAssignments;

    fn deployer() -> Address {
        Address::derive("deployer")
    }

    fn treasury() -> Address {
        Address::derive("treasury")
    }

    fn registry() -> AddressRegistry {
        let mut registry = AddressRegistry::new(deployer());
        registry
            .init(
                &deployer(),
                RoleAssignments {
                    token_issuer: Address::derive("token"),
                    charity_manager: Address::derive("charity"),
                    voter: Address::derive("voting"),
                    treasury: treasury(),
                    asset_list: Address::derive("assets"),
                },
            )
            .unwrap();
        registry
    }

    #[test]
    fn treasury_can_mint() {
        let registry = registry();
        let mut token = CreditToken::new("Governance Credit", "GCR");
        let user = Address::derive("user");

        RegistryMinter::new(&mut token, &registry)
            .mint(&treasury(), &user, 500)
            .unwrap();
        assert_eq!(token.balance_of(&user), 500);
        assert_eq!(token.total_supply(), 500);
        assert_eq!(token.voting_power(&user), 500);
        assert_eq!(token.holders(), 1);
    }

    #[test]
    fn other_minters_rejected() {
        let registry = registry();
        let mut token = CreditToken::new("Governance Credit", "GCR");
        let user = Address::derive("user");

        let err = RegistryMinter::new(&mut token, &registry)
            .mint(&user, &user, 1)
            .unwrap_err();
        assert_eq!(err, LedgerError::MinterNotAuthorized { minter: user });
        assert_eq!(token.total_supply(), 0);
    }

    #[test]
    fn supply_overflow_detected_before_mutation() {
        let registry = registry();
        let mut token = CreditToken::new("Governance Credit", "GCR");
        let user = Address::derive("user");

        let mut minter = RegistryMinter::new(&mut token, &registry);
        minter.mint(&treasury(), &user, Amount::MAX).unwrap();
        assert!(matches!(
            minter.mint(&treasury(), &Address::derive("other"), 1),
            Err(LedgerError::Overflow(_))
        ));
        assert_eq!(token.total_supply(), Amount::MAX);
        assert_eq!(token.balance_of(&Address::derive("other")), 0);
    }
}
