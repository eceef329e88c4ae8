//! Capabilities the core engines consume from their collaborators.
//!
//! The treasury and the voting machine never hold a collaborator directly;
//! they receive these trait objects for the duration of one call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{Address, AssetId};
use crate::error::{Classified, ErrorClass};
use crate::Amount;

/// Conversion rate for one asset, read as a single value.
///
/// `price` is the number of asset units per one credit unit, scaled by
/// `10^decimals`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price: Amount,
    pub decimals: u8,
}

impl PriceQuote {
    pub fn new(price: Amount, decimals: u8) -> Self {
        Self { price, decimals }
    }
}

/// Membership test over the accepted asset set.
pub trait AssetDirectory {
    fn contains(&self, asset: &AssetId) -> bool;
}

/// Current conversion rate per asset. No staleness policy.
pub trait PriceSource {
    fn quote(&self, asset: &AssetId) -> Option<PriceQuote>;
}

/// Mint capability over the internal credit ledger.
pub trait CreditIssuer {
    /// Everything `mint` would check, without minting.
    fn check_mint(&self, minter: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;

    fn mint(&mut self, minter: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;
}

/// Allowance-based pull from an external fungible token.
pub trait TokenLedger {
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

/// Vote weight of an address at the time of the call.
pub trait VotingPower {
    fn voting_power(&self, who: &Address) -> Amount;
}

/// Failures reported by balance-keeping collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("minter {minter} is not authorized to mint")]
    MinterNotAuthorized { minter: Address },

    #[error("insufficient balance: {holder} holds {available}, needs {required}")]
    InsufficientBalance {
        holder: Address,
        required: Amount,
        available: Amount,
    },

    #[error("insufficient allowance: {spender} may move {available} from {owner}, needs {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: Amount,
        available: Amount,
    },

    #[error("ledger arithmetic overflow: {0}")]
    Overflow(String),
}

impl Classified for LedgerError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::MinterNotAuthorized { .. } => ErrorClass::Authorization,
            Self::InsufficientBalance { .. } | Self::InsufficientAllowance { .. } => {
                ErrorClass::Validation
            }
            Self::Overflow(_) => ErrorClass::Arithmetic,
        }
    }
}
