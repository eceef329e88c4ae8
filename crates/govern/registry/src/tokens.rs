use std::collections::HashMap;

use govern_types::{Address, Amount, AssetId, LedgerError, OwnerGuard, TokenLedger};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RegistryError;

/// Emitted when an allowance changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub asset: AssetId,
    pub owner: Address,
    pub spender: Address,
    pub amount: Amount,
}

#[derive(Clone, Debug, Default)]
struct TokenBook {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    supply: Amount,
}

impl TokenBook {
    fn balance_of(&self, who: &Address) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }
}

/// Balances and allowances of external fungible tokens, keyed by asset.
///
/// Stands in for the token contracts the treasury pulls from. Issuance is
/// gated by the bank owner.
#[derive(Clone, Debug)]
pub struct TokenBank {
    guard: OwnerGuard,
    books: HashMap<AssetId, TokenBook>,
}

impl TokenBank {
    pub fn new(owner: Address) -> Self {
        Self {
            guard: OwnerGuard::new(owner),
            books: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.guard.owner()
    }

    /// Issue new units of `asset` to `to`.
    pub fn mint(
        &mut self,
        caller: &Address,
        asset: AssetId,
        to: &Address,
        amount: Amount,
    ) -> Result<(), RegistryError> {
        self.guard.ensure_owner(caller)?;
        if asset.is_native() {
            return Err(RegistryError::NotAToken(asset));
        }
        let book = self.books.entry(asset).or_default();
        let supply = book
            .supply
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("supply of {}", asset)))?;
        let balance = book
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("balance of {}", to)))?;
        book.supply = supply;
        book.balances.insert(*to, balance);
        info!(asset = %asset, to = %to, amount = amount, "Tokens issued");
        Ok(())
    }

    pub fn approve(
        &mut self,
        owner: &Address,
        asset: AssetId,
        spender: &Address,
        amount: Amount,
    ) -> Result<Approval, RegistryError> {
        if asset.is_native() {
            return Err(RegistryError::NotAToken(asset));
        }
        let book = self.books.entry(asset).or_default();
        book.allowances.insert((*owner, *spender), amount);
        debug!(asset = %asset, owner = %owner, spender = %spender, amount = amount, "Allowance set");
        Ok(Approval {
            asset,
            owner: *owner,
            spender: *spender,
            amount,
        })
    }

    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        asset: AssetId,
        spender: &Address,
        added: Amount,
    ) -> Result<Approval, RegistryError> {
        let current = self.allowance(&asset, owner, spender);
        let amount = current
            .checked_add(added)
            .ok_or_else(|| LedgerError::Overflow(format!("allowance of {}", spender)))?;
        self.approve(owner, asset, spender, amount)
    }

    pub fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> Amount {
        self.books
            .get(asset)
            .map(|b| b.allowance(owner, spender))
            .unwrap_or(0)
    }

    pub fn balance_of(&self, asset: &AssetId, who: &Address) -> Amount {
        self.books.get(asset).map(|b| b.balance_of(who)).unwrap_or(0)
    }

    pub fn total_supply(&self, asset: &AssetId) -> Amount {
        self.books.get(asset).map(|b| b.supply).unwrap_or(0)
    }
}

impl TokenLedger for TokenBank {
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowance = self.allowance(asset, from, spender);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                required: amount,
                available: allowance,
            });
        }
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: *from,
                required: amount,
                available,
            });
        }
        let credited = if from == to {
            None
        } else {
            let balance = self
                .balance_of(asset, to)
                .checked_add(amount)
                .ok_or_else(|| LedgerError::Overflow(format!("balance of {}", to)))?;
            Some(balance)
        };

        let book = self.books.entry(*asset).or_default();
        book.allowances.insert((*from, *spender), allowance - amount);
        if let Some(balance) = credited {
            book.balances.insert(*from, available - amount);
            book.balances.insert(*to, balance);
        }
        debug!(asset = %asset, from = %from, to = %to, amount = amount, "Tokens pulled");
        Ok(())
    }
}
