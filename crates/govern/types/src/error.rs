use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;

/// Coarse classification shared by every error in the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Validation,
    Authorization,
    Arithmetic,
    StateConflict,
}

impl ErrorClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Arithmetic => "arithmetic",
            Self::StateConflict => "state_conflict",
        }
    }
}

/// Implemented by error enums that map onto an [`ErrorClass`].
pub trait Classified {
    fn class(&self) -> ErrorClass;
}

/// A non-owner attempted an owner-only mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("caller is not the owner: {caller} (owner {owner})")]
pub struct AuthorizationError {
    pub caller: Address,
    pub owner: Address,
}

impl Classified for AuthorizationError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Authorization
    }
}
