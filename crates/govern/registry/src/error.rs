use govern_types::{Address, AssetId, AuthorizationError, Classified, ErrorClass, LedgerError};
use thiserror::Error;

use crate::address_book::Role;

/// Errors from the owner-gated collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    #[error("registry already initialized")]
    AlreadyInitialized,

    #[error("zero address cannot be assigned to role {0}")]
    ZeroAddress(Role),

    #[error("decimals {decimals} for {asset} exceed the maximum of {max}")]
    DecimalsOutOfRange { asset: AssetId, decimals: u8, max: u8 },

    #[error("{0} is the native currency, not a token")]
    NotAToken(AssetId),

    #[error("Already registered: {0}")]
    AlreadyRegistered(Address),

    #[error("Not registered: {0}")]
    NotRegistered(Address),

    #[error("already verified: {0}")]
    AlreadyVerified(Address),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl Classified for RegistryError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthorized(_) => ErrorClass::Authorization,
            Self::AlreadyInitialized
            | Self::AlreadyRegistered(_)
            | Self::AlreadyVerified(_) => ErrorClass::StateConflict,
            Self::ZeroAddress(_)
            | Self::DecimalsOutOfRange { .. }
            | Self::NotAToken(_)
            | Self::NotRegistered(_) => ErrorClass::Validation,
            Self::Ledger(inner) => inner.class(),
        }
    }
}
