use govern_registry::RegistryError;
use govern_treasury::TreasuryError;
use govern_types::{Classified, ErrorClass, LedgerError};
use govern_voting::VotingError;
use thiserror::Error;

/// A reverted call. State is restored to what it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Treasury(#[from] TreasuryError),

    #[error(transparent)]
    Voting(#[from] VotingError),

    #[error("native transfer failed: {0}")]
    Native(#[from] LedgerError),
}

impl Classified for RuntimeError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Registry(e) => e.class(),
            Self::Treasury(e) => e.class(),
            Self::Voting(e) => e.class(),
            Self::Native(e) => e.class(),
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
