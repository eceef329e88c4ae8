use std::collections::HashMap;

use govern_types::{Address, Amount, Timestamp, VotingPower};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::VotingError;
use crate::proposal::{
    Ballot, ExpiryPolicy, Proposal, ProposalCreated, ProposalFinalized, ProposalPhase, Tally,
    VoteCast, VoteChoice, VotingSchedule,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    Idle,
    Running,
}

impl MachineState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

/// Records produced by a successful `propose`.
///
/// `closed` is only set under [`ExpiryPolicy::CloseOnExpiry`] when an expired
/// proposal had to be finalized first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalReceipt {
    pub closed: Option<ProposalFinalized>,
    pub created: ProposalCreated,
}

/// Static parameters of a [`ProposalMachine`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineParams {
    pub name: String,
    pub schedule: VotingSchedule,
    pub quorum: Amount,
    pub expiry_policy: ExpiryPolicy,
}

impl MachineParams {
    pub fn new(name: impl Into<String>, schedule: VotingSchedule) -> Self {
        Self {
            name: name.into(),
            schedule,
            quorum: 0,
            expiry_policy: ExpiryPolicy::default(),
        }
    }

    pub fn with_quorum(mut self, quorum: Amount) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }
}

/// Single-active-proposal voting machine.
///
/// Idle → Running on `propose`; Running → Idle on `finalize` once the window
/// has closed. At most one proposal is active at any time.
#[derive(Clone, Debug)]
pub struct ProposalMachine {
    params: MachineParams,
    current: Option<Proposal>,
    ballots: HashMap<Address, Ballot>,
    history: Vec<Proposal>,
    next_id: u64,
}

impl ProposalMachine {
    pub fn new(params: MachineParams) -> Self {
        Self {
            params,
            current: None,
            ballots: HashMap::new(),
            history: Vec::new(),
            next_id: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    /// Seconds between creation and the start of voting.
    pub fn voting_delay(&self) -> u64 {
        self.params.schedule.delay_secs
    }

    /// Length of the voting window in seconds.
    pub fn voting_period(&self) -> u64 {
        self.params.schedule.period_secs
    }

    pub fn quorum(&self) -> Amount {
        self.params.quorum
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.params.expiry_policy
    }

    pub fn current(&self) -> Option<&Proposal> {
        self.current.as_ref()
    }

    pub fn state(&self) -> MachineState {
        if self.current.is_some() {
            MachineState::Running
        } else {
            MachineState::Idle
        }
    }

    /// Phase of the running proposal at `now`, if any.
    pub fn phase(&self, now: Timestamp) -> Option<ProposalPhase> {
        self.current.as_ref().map(|p| p.phase(now))
    }

    /// Finalized proposals, oldest first.
    pub fn history(&self) -> &[Proposal] {
        &self.history
    }

    /// The ballot `voter` cast on the running proposal.
    pub fn ballot(&self, voter: &Address) -> Option<&Ballot> {
        self.ballots.get(voter)
    }

    pub fn propose(
        &mut self,
        proposer: &Address,
        description: impl Into<String>,
        now: Timestamp,
    ) -> Result<ProposalReceipt, VotingError> {
        let close_first = match &self.current {
            None => false,
            Some(running) => {
                let expired = running.phase(now) == ProposalPhase::Ended;
                if !(expired && self.params.expiry_policy == ExpiryPolicy::CloseOnExpiry) {
                    debug!(proposal_id = running.id, proposer = %proposer, "Propose rejected: proposal running");
                    return Err(VotingError::ProposalAlreadyRunning {
                        proposal_id: running.id,
                    });
                }
                true
            }
        };

        let (voting_starts, voting_ends) = self.params.schedule.window(now)?;
        let closed = if close_first {
            Some(self.close(now)?)
        } else {
            None
        };

        let description = description.into();
        let id = self.next_id;
        self.next_id += 1;
        self.current = Some(Proposal {
            id,
            description: description.clone(),
            proposer: *proposer,
            created_at: now,
            voting_starts,
            voting_ends,
            active: true,
            tally: Tally::default(),
            outcome: None,
        });
        info!(
            governor = %self.params.name,
            proposal_id = id,
            proposer = %proposer,
            voting_starts = %voting_starts,
            voting_ends = %voting_ends,
            "Proposal created"
        );

        Ok(ProposalReceipt {
            closed,
            created: ProposalCreated {
                created_at: now,
                proposer: *proposer,
                voting_starts,
                voting_ends,
                description,
            },
        })
    }

    /// Record `voter`'s ballot, weighted by their current voting power.
    pub fn cast_vote(
        &mut self,
        voter: &Address,
        choice: VoteChoice,
        power: &dyn VotingPower,
        now: Timestamp,
    ) -> Result<VoteCast, VotingError> {
        let proposal = self.current.as_mut().ok_or(VotingError::NoActiveProposal)?;
        match proposal.phase(now) {
            ProposalPhase::Pending => {
                return Err(VotingError::VotingNotStarted {
                    starts: proposal.voting_starts,
                })
            }
            ProposalPhase::Ended => {
                return Err(VotingError::VotingEnded {
                    ends: proposal.voting_ends,
                })
            }
            ProposalPhase::Voting => {}
        }
        if self.ballots.contains_key(voter) {
            return Err(VotingError::AlreadyVoted(*voter));
        }
        let weight = power.voting_power(voter);
        if weight == 0 {
            return Err(VotingError::NoVotingPower(*voter));
        }

        proposal.tally = proposal.tally.with_vote(choice, weight)?;
        self.ballots.insert(
            *voter,
            Ballot {
                choice,
                weight,
                cast_at: now,
            },
        );
        debug!(proposal_id = proposal.id, voter = %voter, ?choice, weight = weight, "Vote cast");
        Ok(VoteCast {
            proposal_id: proposal.id,
            voter: *voter,
            choice,
            weight,
        })
    }

    /// Close the running proposal once its window has ended.
    pub fn finalize(&mut self, now: Timestamp) -> Result<ProposalFinalized, VotingError> {
        let proposal = self.current.as_ref().ok_or(VotingError::NoActiveProposal)?;
        if proposal.phase(now) != ProposalPhase::Ended {
            return Err(VotingError::VotingStillOpen {
                ends: proposal.voting_ends,
            });
        }
        self.close(now)
    }

    fn close(&mut self, now: Timestamp) -> Result<ProposalFinalized, VotingError> {
        let mut proposal = self.current.take().ok_or(VotingError::NoActiveProposal)?;
        let outcome = proposal.tally.outcome(self.params.quorum);
        proposal.active = false;
        proposal.outcome = Some(outcome);
        self.ballots.clear();

        info!(
            governor = %self.params.name,
            proposal_id = proposal.id,
            ?outcome,
            for_votes = proposal.tally.for_votes,
            against_votes = proposal.tally.against_votes,
            abstain_votes = proposal.tally.abstain_votes,
            "Proposal finalized"
        );
        let finalized = ProposalFinalized {
            proposal_id: proposal.id,
            outcome,
            tally: proposal.tally,
            finalized_at: now,
        };
        self.history.push(proposal);
        Ok(finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::Outcome;
    use proptest::prelude::*;

    const DELAY: u64 = 100;
    const PERIOD: u64 = 1_000;

    struct Weights(HashMap<Address, Amount>);

    impl VotingPower for Weights {
        fn voting_power(&self, who: &Address) -> Amount {
            self.0.get(who).copied().unwrap_or(0)
        }
    }

    fn alice() -> Address {
        Address::derive("alice")
    }

    fn bob() -> Address {
        Address::derive("bob")
    }

    fn weights() -> Weights {
        Weights(HashMap::from([(alice(), 60), (bob(), 40)]))
    }

    fn machine() -> ProposalMachine {
        ProposalMachine::new(MachineParams::new("GOV", VotingSchedule::new(DELAY, PERIOD)))
    }

    #[test]
    fn accessors_report_construction_parameters() {
        let m = machine();
        assert_eq!(m.name(), "GOV");
        assert_eq!(m.voting_delay(), DELAY);
        assert_eq!(m.voting_period(), PERIOD);
        assert_eq!(m.state(), MachineState::Idle);
        assert_eq!(m.phase(Timestamp(0)), None);
    }

    #[test]
    fn propose_sets_window_from_one_reading() {
        let mut m = machine();
        let receipt = m.propose(&alice(), "plant trees", Timestamp(5_000)).unwrap();
        assert_eq!(
            receipt.created,
            ProposalCreated {
                created_at: Timestamp(5_000),
                proposer: alice(),
                voting_starts: Timestamp(5_100),
                voting_ends: Timestamp(6_100),
                description: "plant trees".into(),
            }
        );
        assert!(receipt.closed.is_none());
        let current = m.current().unwrap();
        assert!(current.active);
        assert_eq!(current.id, 1);
        assert_eq!(m.state(), MachineState::Running);
    }

    #[test]
    fn second_propose_is_rejected() {
        let mut m = machine();
        m.propose(&alice(), "first", Timestamp(0)).unwrap();
        let err = m.propose(&bob(), "second", Timestamp(1)).unwrap_err();
        assert_eq!(err.to_string(), "Proposal is already running");
        assert_eq!(m.current().unwrap().description, "first");
    }

    #[test]
    fn overflowing_window_leaves_machine_idle() {
        let mut m = machine();
        assert!(matches!(
            m.propose(&alice(), "late", Timestamp(u64::MAX - 10)),
            Err(VotingError::ArithmeticOverflow(_))
        ));
        assert_eq!(m.state(), MachineState::Idle);
    }

    #[test]
    fn vote_window_is_half_open() {
        let mut m = machine();
        m.propose(&alice(), "p", Timestamp(0)).unwrap();
        let w = weights();

        assert_eq!(
            m.cast_vote(&alice(), VoteChoice::For, &w, Timestamp(DELAY - 1)),
            Err(VotingError::VotingNotStarted {
                starts: Timestamp(DELAY)
            })
        );
        m.cast_vote(&alice(), VoteChoice::For, &w, Timestamp(DELAY)).unwrap();
        assert_eq!(
            m.cast_vote(&bob(), VoteChoice::Against, &w, Timestamp(DELAY + PERIOD)),
            Err(VotingError::VotingEnded {
                ends: Timestamp(DELAY + PERIOD)
            })
        );
        m.cast_vote(&bob(), VoteChoice::Against, &w, Timestamp(DELAY + PERIOD - 1))
            .unwrap();
        assert_eq!(m.current().unwrap().tally.for_votes, 60);
        assert_eq!(m.current().unwrap().tally.against_votes, 40);
    }

    #[test]
    fn double_vote_and_zero_power_rejected() {
        let mut m = machine();
        m.propose(&alice(), "p", Timestamp(0)).unwrap();
        let w = weights();
        m.cast_vote(&alice(), VoteChoice::Abstain, &w, Timestamp(DELAY)).unwrap();
        assert_eq!(
            m.cast_vote(&alice(), VoteChoice::For, &w, Timestamp(DELAY + 1)),
            Err(VotingError::AlreadyVoted(alice()))
        );
        let carol = Address::derive("carol");
        assert_eq!(
            m.cast_vote(&carol, VoteChoice::For, &w, Timestamp(DELAY + 1)),
            Err(VotingError::NoVotingPower(carol))
        );
        assert_eq!(m.ballot(&alice()).unwrap().choice, VoteChoice::Abstain);
    }

    #[test]
    fn vote_without_proposal() {
        let mut m = machine();
        assert_eq!(
            m.cast_vote(&alice(), VoteChoice::For, &weights(), Timestamp(0)),
            Err(VotingError::NoActiveProposal)
        );
    }

    #[test]
    fn finalize_requires_ended_window() {
        let mut m = machine();
        assert_eq!(m.finalize(Timestamp(0)), Err(VotingError::NoActiveProposal));

        m.propose(&alice(), "p", Timestamp(0)).unwrap();
        m.cast_vote(&alice(), VoteChoice::For, &weights(), Timestamp(DELAY)).unwrap();
        assert_eq!(
            m.finalize(Timestamp(DELAY + PERIOD - 1)),
            Err(VotingError::VotingStillOpen {
                ends: Timestamp(DELAY + PERIOD)
            })
        );

        let finalized = m.finalize(Timestamp(DELAY + PERIOD)).unwrap();
        assert_eq!(finalized.outcome, Outcome::Succeeded);
        assert_eq!(finalized.proposal_id, 1);
        assert_eq!(m.state(), MachineState::Idle);
        assert_eq!(m.history().len(), 1);
        assert!(!m.history()[0].active);
        assert!(m.ballot(&alice()).is_none());

        let receipt = m.propose(&bob(), "next", Timestamp(DELAY + PERIOD + 1)).unwrap();
        assert!(receipt.closed.is_none());
        assert_eq!(m.current().unwrap().id, 2);
    }

    #[test]
    fn quorum_gates_outcome() {
        let mut m = ProposalMachine::new(
            MachineParams::new("GOV", VotingSchedule::new(DELAY, PERIOD)).with_quorum(100),
        );
        m.propose(&alice(), "p", Timestamp(0)).unwrap();
        m.cast_vote(&alice(), VoteChoice::For, &weights(), Timestamp(DELAY)).unwrap();
        let finalized = m.finalize(Timestamp(DELAY + PERIOD)).unwrap();
        assert_eq!(finalized.outcome, Outcome::QuorumNotReached);
    }

    #[test]
    fn expired_proposal_blocks_by_default() {
        let mut m = machine();
        m.propose(&alice(), "p", Timestamp(0)).unwrap();
        assert!(matches!(
            m.propose(&bob(), "q", Timestamp(10 * PERIOD)),
            Err(VotingError::ProposalAlreadyRunning { proposal_id: 1 })
        ));
    }

    #[test]
    fn close_on_expiry_finalizes_then_creates() {
        let mut m = ProposalMachine::new(
            MachineParams::new("GOV", VotingSchedule::new(DELAY, PERIOD))
                .with_expiry_policy(ExpiryPolicy::CloseOnExpiry),
        );
        m.propose(&alice(), "p", Timestamp(0)).unwrap();
        assert!(m.propose(&bob(), "q", Timestamp(DELAY + PERIOD - 1)).is_err());

        let receipt = m.propose(&bob(), "q", Timestamp(DELAY + PERIOD)).unwrap();
        let closed = receipt.closed.unwrap();
        assert_eq!(closed.proposal_id, 1);
        assert_eq!(closed.outcome, Outcome::Defeated);
        assert_eq!(receipt.created.proposer, bob());
        assert_eq!(m.current().unwrap().id, 2);
        assert_eq!(m.history().len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Propose,
        Finalize,
        Advance(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Propose),
            Just(Op::Finalize),
            (0u64..3 * PERIOD).prop_map(Op::Advance),
        ]
    }

    proptest! {
        #[test]
        fn never_more_than_one_active(ops in proptest::collection::vec(op(), 1..40), close in any::<bool>()) {
            let policy = if close { ExpiryPolicy::CloseOnExpiry } else { ExpiryPolicy::ExplicitFinalize };
            let mut m = ProposalMachine::new(
                MachineParams::new("GOV", VotingSchedule::new(DELAY, PERIOD)).with_expiry_policy(policy),
            );
            let mut now = 0u64;
            for op in ops {
                match op {
                    Op::Propose => {
                        let was_running = m.current().is_some();
                        let result = m.propose(&alice(), "p", Timestamp(now));
                        if was_running && policy == ExpiryPolicy::ExplicitFinalize {
                            prop_assert!(result.is_err());
                        }
                    }
                    Op::Finalize => {
                        let _ = m.finalize(Timestamp(now));
                    }
                    Op::Advance(secs) => now += secs,
                }
                prop_assert!(m.history().iter().all(|p| !p.active));
                let ids: Vec<u64> = m.history().iter().map(|p| p.id).collect();
                prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
                if let Some(current) = m.current() {
                    prop_assert!(current.active);
                    prop_assert!(ids.iter().all(|id| *id < current.id));
                }
            }
        }
    }
}
