//! # govern-registry
//!
//! The bookkeeping collaborators around the treasury and the voting machine.
//! Each owner-gated component embeds a [`govern_types::OwnerGuard`]; reads are
//! unrestricted.
//!
//! - [`AddressRegistry`]: role → address directory, initialized once
//! - [`AssetRegistry`]: append-only set of accepted assets
//! - [`PriceOracle`]: per-asset `(price, decimals)` quotes
//! - [`CharityRegistry`]: Unregistered → Pending → Verified
//! - [`CreditToken`] / [`RegistryMinter`]: internal credit, mintable only by
//!   the registry's treasury
//! - [`TokenBank`]: external token balances and allowances

pub mod address_book;
pub mod assets;
pub mod charity;
pub mod credit;
pub mod error;
pub mod oracle;
pub mod tokens;

pub use address_book::{AddressRegistry, Role, RoleAssigned, RoleAssignments};
pub use assets::{AssetAccepted, AssetRegistry};
pub use charity::{CharityRecord, CharityRegistry, CharityStatus, Registered, Verified};
pub use credit::{CreditToken, RegistryMinter, CREDIT_DECIMALS};
pub use error::RegistryError;
pub use oracle::{PriceOracle, PriceUpdated, MAX_DECIMALS};
pub use tokens::{Approval, TokenBank};
