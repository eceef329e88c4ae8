use std::time::Duration;

use govern_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Seconds between proposal creation and the opening of voting, and the
/// length of the voting window. Fixed when the machine is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSchedule {
    pub delay_secs: u64,
    pub period_secs: u64,
}

impl VotingSchedule {
    pub const ONE_DAY: u64 = 24 * 60 * 60;
    pub const ONE_WEEK: u64 = 7 * Self::ONE_DAY;

    pub fn new(delay_secs: u64, period_secs: u64) -> Self {
        Self {
            delay_secs,
            period_secs,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    /// `(votingStarts, votingEnds)` for a proposal created at `now`.
    pub fn window(&self, now: Timestamp) -> Result<(Timestamp, Timestamp), VotingError> {
        let starts = now.checked_add_secs(self.delay_secs).ok_or_else(|| {
            VotingError::ArithmeticOverflow(format!("{} + delay {}s", now.as_secs(), self.delay_secs))
        })?;
        let ends = starts.checked_add_secs(self.period_secs).ok_or_else(|| {
            VotingError::ArithmeticOverflow(format!(
                "{} + period {}s",
                starts.as_secs(),
                self.period_secs
            ))
        })?;
        Ok((starts, ends))
    }
}

impl Default for VotingSchedule {
    fn default() -> Self {
        Self::new(Self::ONE_DAY, Self::ONE_WEEK)
    }
}

/// What happens to a proposal whose window has closed but that nobody finalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// The proposal keeps blocking `propose` until `finalize` is called.
    #[default]
    ExplicitFinalize,
    /// `propose` finalizes the expired proposal before creating the new one.
    CloseOnExpiry,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
    Abstain,
}

/// Weighted vote totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub for_votes: Amount,
    pub against_votes: Amount,
    pub abstain_votes: Amount,
}

impl Tally {
    /// Sum of all three columns, or `None` on overflow.
    pub fn total(&self) -> Option<Amount> {
        self.for_votes
            .checked_add(self.against_votes)?
            .checked_add(self.abstain_votes)
    }

    /// The tally after adding `weight` to `choice`. Leaves `self` untouched on overflow.
    pub fn with_vote(&self, choice: VoteChoice, weight: Amount) -> Result<Self, VotingError> {
        let mut next = *self;
        let column = match choice {
            VoteChoice::For => &mut next.for_votes,
            VoteChoice::Against => &mut next.against_votes,
            VoteChoice::Abstain => &mut next.abstain_votes,
        };
        *column = column
            .checked_add(weight)
            .ok_or_else(|| VotingError::ArithmeticOverflow(format!("{:?} tally", choice)))?;
        next.total()
            .ok_or_else(|| VotingError::ArithmeticOverflow("total tally".into()))?;
        Ok(next)
    }

    pub fn outcome(&self, quorum: Amount) -> Outcome {
        // total() is kept in range by with_vote.
        let total = self.total().unwrap_or(Amount::MAX);
        if total < quorum {
            Outcome::QuorumNotReached
        } else if self.for_votes > self.against_votes {
            Outcome::Succeeded
        } else {
            Outcome::Defeated
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Defeated,
    QuorumNotReached,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub description: String,
    pub proposer: Address,
    pub created_at: Timestamp,
    pub voting_starts: Timestamp,
    pub voting_ends: Timestamp,
    pub active: bool,
    pub tally: Tally,
    pub outcome: Option<Outcome>,
}

impl Proposal {
    pub fn phase(&self, now: Timestamp) -> ProposalPhase {
        if now < self.voting_starts {
            ProposalPhase::Pending
        } else if now < self.voting_ends {
            ProposalPhase::Voting
        } else {
            ProposalPhase::Ended
        }
    }
}

/// Where `now` falls relative to a proposal's window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalPhase {
    Pending,
    Voting,
    Ended,
}

/// Emitted by `propose`. Field order is part of the record format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreated {
    pub created_at: Timestamp,
    pub proposer: Address,
    pub voting_starts: Timestamp,
    pub voting_ends: Timestamp,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCast {
    pub proposal_id: u64,
    pub voter: Address,
    pub choice: VoteChoice,
    pub weight: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalFinalized {
    pub proposal_id: u64,
    pub outcome: Outcome,
    pub tally: Tally,
    pub finalized_at: Timestamp,
}

/// A recorded ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub choice: VoteChoice,
    pub weight: Amount,
    pub cast_at: Timestamp,
}
