use govern_registry::{
    Approval, AssetAccepted, PriceUpdated, Registered, RoleAssigned, Verified,
};
use govern_treasury::Deposited;
use govern_types::{Address, Amount, AssetId, Timestamp};
use govern_voting::{ProposalCreated, ProposalFinalized, VoteCast};
use serde::Serialize;
use uuid::Uuid;

/// Every record a successful call can emit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    RoleAssigned(RoleAssigned),
    AssetAccepted(AssetAccepted),
    PriceUpdated(PriceUpdated),
    Registered(Registered),
    Verified(Verified),
    TokensIssued {
        asset: AssetId,
        to: Address,
        amount: Amount,
    },
    Approval(Approval),
    NativeFunded {
        account: Address,
        balance: Amount,
    },
    NativeTransferred {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Deposited(Deposited),
    ProposalCreated(ProposalCreated),
    VoteCast(VoteCast),
    ProposalFinalized(ProposalFinalized),
}

impl GovernanceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoleAssigned(_) => "role_assigned",
            Self::AssetAccepted(_) => "asset_accepted",
            Self::PriceUpdated(_) => "price_updated",
            Self::Registered(_) => "registered",
            Self::Verified(_) => "verified",
            Self::TokensIssued { .. } => "tokens_issued",
            Self::Approval(_) => "approval",
            Self::NativeFunded { .. } => "native_funded",
            Self::NativeTransferred { .. } => "native_transferred",
            Self::Deposited(_) => "deposited",
            Self::ProposalCreated(_) => "proposal_created",
            Self::VoteCast(_) => "vote_cast",
            Self::ProposalFinalized(_) => "proposal_finalized",
        }
    }
}

/// Result of a committed call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CallReceipt {
    pub call_id: Uuid,
    pub caller: Address,
    pub at: Timestamp,
    pub events: Vec<GovernanceEvent>,
}

impl CallReceipt {
    pub fn first(&self, name: &str) -> Option<&GovernanceEvent> {
        self.events.iter().find(|e| e.name() == name)
    }
}

/// One entry of the runtime's ordered event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub seq: u64,
    pub call_id: Uuid,
    pub at: Timestamp,
    pub event: GovernanceEvent,
}
