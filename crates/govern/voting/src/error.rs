use govern_types::{Address, Classified, ErrorClass, Timestamp};
use thiserror::Error;

/// Errors from the proposal voting state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("Proposal is already running")]
    ProposalAlreadyRunning { proposal_id: u64 },

    #[error("no proposal is running")]
    NoActiveProposal,

    #[error("voting has not started: opens at {starts}")]
    VotingNotStarted { starts: Timestamp },

    #[error("voting has ended: closed at {ends}")]
    VotingEnded { ends: Timestamp },

    #[error("voting is still open until {ends}")]
    VotingStillOpen { ends: Timestamp },

    #[error("{0} has already voted on this proposal")]
    AlreadyVoted(Address),

    #[error("{0} has no voting power")]
    NoVotingPower(Address),

    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
}

impl Classified for VotingError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::ProposalAlreadyRunning { .. }
            | Self::NoActiveProposal
            | Self::VotingNotStarted { .. }
            | Self::VotingEnded { .. }
            | Self::VotingStillOpen { .. }
            | Self::AlreadyVoted(_) => ErrorClass::StateConflict,
            Self::NoVotingPower(_) => ErrorClass::Validation,
            Self::ArithmeticOverflow(_) => ErrorClass::Arithmetic,
        }
    }
}
