use std::collections::BTreeMap;

use govern_types::{Address, Amount, AssetId, OwnerGuard, PriceQuote, PriceSource};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RegistryError;

/// Largest decimal precision whose scale factor `10^decimals` fits in 128 bits.
pub const MAX_DECIMALS: u8 = 38;

/// Emitted on every quote change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceUpdated {
    pub asset: AssetId,
    pub price: Amount,
    pub decimals: u8,
}

/// Per-asset `(price, decimals)` table maintained by the oracle owner.
///
/// Quotes are always read as a pair, so a reader never sees the price of one
/// update combined with the decimals of another.
#[derive(Clone, Debug)]
pub struct PriceOracle {
    guard: OwnerGuard,
    quotes: BTreeMap<AssetId, PriceQuote>,
}

impl PriceOracle {
    pub fn new(owner: Address) -> Self {
        Self {
            guard: OwnerGuard::new(owner),
            quotes: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> Address {
        self.guard.owner()
    }

    pub fn set_quote(
        &mut self,
        caller: &Address,
        asset: AssetId,
        price: Amount,
        decimals: u8,
    ) -> Result<PriceUpdated, RegistryError> {
        self.guard.ensure_owner(caller)?;
        if decimals > MAX_DECIMALS {
            return Err(RegistryError::DecimalsOutOfRange {
                asset,
                decimals,
                max: MAX_DECIMALS,
            });
        }
        self.quotes.insert(asset, PriceQuote::new(price, decimals));
        info!(asset = %asset, price = price, decimals = decimals, "Price quote updated");
        Ok(PriceUpdated {
            asset,
            price,
            decimals,
        })
    }

    /// Change only the price, keeping the current decimals (0 if none yet).
    pub fn set_price(
        &mut self,
        caller: &Address,
        asset: AssetId,
        price: Amount,
    ) -> Result<PriceUpdated, RegistryError> {
        let decimals = self.quotes.get(&asset).map(|q| q.decimals).unwrap_or(0);
        self.set_quote(caller, asset, price, decimals)
    }

    /// Change only the decimals, keeping the current price (0 if none yet).
    pub fn set_decimals(
        &mut self,
        caller: &Address,
        asset: AssetId,
        decimals: u8,
    ) -> Result<PriceUpdated, RegistryError> {
        let price = self.quotes.get(&asset).map(|q| q.price).unwrap_or(0);
        self.set_quote(caller, asset, price, decimals)
    }

    pub fn price(&self, asset: &AssetId) -> Option<Amount> {
        self.quotes.get(asset).map(|q| q.price)
    }

    pub fn decimals(&self, asset: &AssetId) -> Option<u8> {
        self.quotes.get(asset).map(|q| q.decimals)
    }
}

impl PriceSource for PriceOracle {
    fn quote(&self, asset: &AssetId) -> Option<PriceQuote> {
        self.quotes.get(asset).copied()
    }
}
