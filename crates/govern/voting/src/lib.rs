//! # govern-voting
//!
//! Single-active-proposal voting. A proposal is created with one clock
//! reading, waits out the voting delay, accepts weighted ballots during a
//! half-open window `[votingStarts, votingEnds)` and is closed by an
//! explicit [`ProposalMachine::finalize`] (or, under
//! [`ExpiryPolicy::CloseOnExpiry`], by the next `propose`).

pub mod error;
pub mod machine;
pub mod proposal;

pub use error::VotingError;
pub use machine::{MachineParams, MachineState, ProposalMachine, ProposalReceipt};
pub use proposal::{
    Ballot, ExpiryPolicy, Outcome, Proposal, ProposalCreated, ProposalFinalized, ProposalPhase,
    Tally, VoteCast, VoteChoice, VotingSchedule,
};
