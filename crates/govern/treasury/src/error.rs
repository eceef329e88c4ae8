use govern_types::{Amount, AssetId, Classified, ErrorClass, LedgerError};
use thiserror::Error;

/// Errors from the treasury conversion engine.
///
/// Every variant is raised before the engine performs any effect, except
/// `TransferFailed`, which is the first effect and leaves nothing behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("unsupported asset: {0}")]
    UnsupportedAsset(AssetId),

    #[error("deposit of {0} carries no value")]
    EmptyDeposit(AssetId),

    #[error("attached native value {attached} inconsistent with declared amount {amount} for {asset}")]
    NativeValueMismatch {
        asset: AssetId,
        amount: Amount,
        attached: Amount,
    },

    #[error("invalid price for {0}: quote missing or zero")]
    InvalidPrice(AssetId),

    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),

    #[error("transfer of {asset} failed: {source}")]
    TransferFailed {
        asset: AssetId,
        #[source]
        source: LedgerError,
    },

    #[error("credit mint rejected: {0}")]
    MintRejected(#[source] LedgerError),
}

impl Classified for TreasuryError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedAsset(_)
            | Self::EmptyDeposit(_)
            | Self::NativeValueMismatch { .. }
            | Self::TransferFailed { .. } => ErrorClass::Validation,
            Self::InvalidPrice(_) | Self::ArithmeticOverflow(_) => ErrorClass::Arithmetic,
            Self::MintRejected(inner) => inner.class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govern_types::Address;

    #[test]
    fn classes_follow_taxonomy() {
        assert_eq!(
            TreasuryError::UnsupportedAsset(AssetId::NATIVE).class(),
            ErrorClass::Validation
        );
        assert_eq!(
            TreasuryError::InvalidPrice(AssetId::NATIVE).class(),
            ErrorClass::Arithmetic
        );
        assert_eq!(
            TreasuryError::MintRejected(LedgerError::MinterNotAuthorized {
                minter: Address::derive("x")
            })
            .class(),
            ErrorClass::Authorization
        );
    }

    #[test]
    fn transfer_failure_display_includes_cause() {
        let err = TreasuryError::TransferFailed {
            asset: AssetId::token(Address::derive("t")),
            source: LedgerError::InsufficientBalance {
                holder: Address::derive("u"),
                required: 5,
                available: 1,
            },
        };
        assert!(err.to_string().contains("insufficient balance"));
    }
}
