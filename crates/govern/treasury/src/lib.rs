//! # govern-treasury
//!
//! Treasury Conversion Engine: accepts deposits of any registered asset and
//! issues internal credit at the oracle rate.
//!
//! ```text
//! credit = floor(quantity × 10^decimals / price)
//! ```
//!
//! The product is formed in 256 bits; results that do not fit the 128-bit
//! credit amount fail with `ArithmeticOverflow` instead of wrapping. A zero or
//! missing price fails with `InvalidPrice`.
//!
//! The engine owns only its own accounting (holdings per asset, credit issued).
//! Asset membership, prices, token balances and the credit ledger are reached
//! through the capability traits in `govern-types`, borrowed for one call via
//! [`TreasuryPorts`].

pub mod conversion;
pub mod engine;
pub mod error;

pub use conversion::{credit_for, mul_div_floor, scale_factor};
pub use engine::{DepositRequest, Deposited, TreasuryEngine, TreasuryPorts};
pub use error::TreasuryError;
