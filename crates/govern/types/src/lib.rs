//! # govern-types
//!
//! Vocabulary shared by every governance crate:
//!
//! - [`Address`] / [`AssetId`]: 20-byte identifiers; the zero address is the
//!   native currency sentinel
//! - [`Timestamp`] and the [`Clock`] seam
//! - [`OwnerGuard`]: the single owner-gated authorization check reused by
//!   every collaborator
//! - Capability traits ([`AssetDirectory`], [`PriceSource`], [`CreditIssuer`],
//!   [`TokenLedger`], [`VotingPower`]) through which the core engines reach
//!   their collaborators
//! - [`ErrorClass`]: validation / authorization / arithmetic / state-conflict

pub mod address;
pub mod auth;
pub mod call;
pub mod capability;
pub mod error;
pub mod time;

/// Token quantities in base units.
pub type Amount = u128;

pub use address::{Address, AddressParseError, AssetId, ADDRESS_LEN};
pub use auth::OwnerGuard;
pub use call::CallContext;
pub use capability::{
    AssetDirectory, CreditIssuer, LedgerError, PriceQuote, PriceSource, TokenLedger, VotingPower,
};
pub use error::{AuthorizationError, Classified, ErrorClass};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
