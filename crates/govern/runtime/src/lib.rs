//! # govern-runtime
//!
//! Hosts the governance components on one ledger and executes calls against
//! it atomically.
//!
//! ```text
//!  caller ──► GovernanceRuntime::transact ──► snapshot
//!                     │
//!        ┌────────────┼──────────────┬───────────────┐
//!        ▼            ▼              ▼               ▼
//!  TreasuryEngine  ProposalMachine  CharityRegistry  AddressRegistry / AssetRegistry /
//!        │            │                               PriceOracle / TokenBank
//!        └─ RegistryMinter ─► CreditToken ◄─ voting power
//! ```
//!
//! A call either commits all of its effects and appends its events to the log,
//! or reverts to the snapshot.

pub mod config;
pub mod error;
pub mod events;
pub mod runtime;
pub mod scenario;
pub mod state;
pub mod substrate;

pub use config::{GovernanceConfig, LoggingConfig, TreasuryConfig, VotingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use events::{CallReceipt, EventRecord, GovernanceEvent};
pub use runtime::GovernanceRuntime;
pub use scenario::{run_scenario, Scenario, ScenarioError, ScenarioReport};
pub use state::{ComponentAddresses, LedgerState};
pub use substrate::NativeBank;
