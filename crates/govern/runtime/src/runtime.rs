use govern_registry::{RegistryMinter, Role, RoleAssignments};
use govern_treasury::{DepositRequest, TreasuryPorts};
use govern_types::{Address, Amount, AssetId, CallContext, Classified, Clock, Timestamp};
use govern_voting::VoteChoice;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::config::GovernanceConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::{CallReceipt, EventRecord, GovernanceEvent};
use crate::state::{ComponentAddresses, LedgerState};

/// Single-threaded transactional host for the governance components.
///
/// Every entry point runs against a snapshot: on error the whole state is
/// restored and no event is logged. Each call reads the clock exactly once.
pub struct GovernanceRuntime<C: Clock> {
    clock: C,
    owner: Address,
    addresses: ComponentAddresses,
    state: LedgerState,
    log: Vec<EventRecord>,
}

impl<C: Clock> GovernanceRuntime<C> {
    /// Construct every component owned by `owner`. The address registry is
    /// left uninitialized.
    pub fn deploy(config: &GovernanceConfig, owner: Address, clock: C) -> Self {
        let addresses = ComponentAddresses::derive(&owner);
        let state = LedgerState::new(config, owner, &addresses);
        info!(
            owner = %owner,
            treasury = %addresses.treasury,
            governor = %config.voting.name,
            "Governance deployed"
        );
        Self {
            clock,
            owner,
            addresses,
            state,
            log: Vec::new(),
        }
    }

    /// [`deploy`](Self::deploy), then wire the registry to the deployed components.
    pub fn bootstrap(config: &GovernanceConfig, owner: Address, clock: C) -> RuntimeResult<Self> {
        let mut runtime = Self::deploy(config, owner, clock);
        let assignments = runtime.addresses.role_assignments();
        runtime.init_registry(owner, assignments)?;
        Ok(runtime)
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn addresses(&self) -> &ComponentAddresses {
        &self.addresses
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Committed events in emission order.
    pub fn events(&self) -> &[EventRecord] {
        &self.log
    }

    pub fn voting_delay(&self) -> u64 {
        self.state.voting.voting_delay()
    }

    pub fn voting_period(&self) -> u64 {
        self.state.voting.voting_period()
    }

    pub fn credit_balance(&self, who: &Address) -> Amount {
        self.state.credit.balance_of(who)
    }

    // Registry

    pub fn init_registry(
        &mut self,
        caller: Address,
        assignments: RoleAssignments,
    ) -> RuntimeResult<CallReceipt> {
        self.transact("registry.init", caller, 0, |state, ctx| {
            let assigned = state.registry.init(&ctx.caller, assignments)?;
            Ok(assigned.into_iter().map(GovernanceEvent::RoleAssigned).collect())
        })
    }

    pub fn set_role(&mut self, caller: Address, role: Role, address: Address) -> RuntimeResult<CallReceipt> {
        self.transact("registry.set", caller, 0, |state, ctx| {
            let assigned = state.registry.set(&ctx.caller, role, address)?;
            Ok(vec![GovernanceEvent::RoleAssigned(assigned)])
        })
    }

    /// Point the registry's treasury role at `treasury`.
    pub fn set_governance_treasury(&mut self, caller: Address, treasury: Address) -> RuntimeResult<CallReceipt> {
        self.set_role(caller, Role::Treasury, treasury)
    }

    // Assets and prices

    pub fn add_asset(&mut self, caller: Address, asset: AssetId) -> RuntimeResult<CallReceipt> {
        self.transact("assets.add", caller, 0, |state, ctx| {
            let accepted = state.assets.add(&ctx.caller, asset)?;
            Ok(accepted.into_iter().map(GovernanceEvent::AssetAccepted).collect())
        })
    }

    pub fn set_quote(
        &mut self,
        caller: Address,
        asset: AssetId,
        price: Amount,
        decimals: u8,
    ) -> RuntimeResult<CallReceipt> {
        self.transact("oracle.set_quote", caller, 0, |state, ctx| {
            let updated = state.oracle.set_quote(&ctx.caller, asset, price, decimals)?;
            Ok(vec![GovernanceEvent::PriceUpdated(updated)])
        })
    }

    // Tokens and native value

    pub fn mint_tokens(
        &mut self,
        caller: Address,
        asset: AssetId,
        to: Address,
        amount: Amount,
    ) -> RuntimeResult<CallReceipt> {
        self.transact("tokens.mint", caller, 0, |state, ctx| {
            state.tokens.mint(&ctx.caller, asset, &to, amount)?;
            Ok(vec![GovernanceEvent::TokensIssued { asset, to, amount }])
        })
    }

    /// The caller approves `spender` to pull up to `amount` of `asset`.
    pub fn approve(
        &mut self,
        caller: Address,
        asset: AssetId,
        spender: Address,
        amount: Amount,
    ) -> RuntimeResult<CallReceipt> {
        self.transact("tokens.approve", caller, 0, |state, ctx| {
            let approval = state.tokens.approve(&ctx.caller, asset, &spender, amount)?;
            Ok(vec![GovernanceEvent::Approval(approval)])
        })
    }

    /// Set an account's native balance. Local substrate only.
    pub fn fund(&mut self, account: Address, balance: Amount) -> RuntimeResult<CallReceipt> {
        let owner = self.owner;
        self.transact("substrate.fund", owner, 0, |state, _ctx| {
            state.native.set_balance(&account, balance);
            Ok(vec![GovernanceEvent::NativeFunded { account, balance }])
        })
    }

    // Treasury

    /// Deposit `asset` with `value` native units attached to the call.
    pub fn deposit(
        &mut self,
        caller: Address,
        request: DepositRequest,
        value: Amount,
    ) -> RuntimeResult<CallReceipt> {
        self.transact("treasury.deposit", caller, value, |state, ctx| {
            let mut events = Vec::new();
            let treasury_address = state.treasury.address();
            if ctx.value > 0 {
                state.native.transfer(&ctx.caller, &treasury_address, ctx.value)?;
                events.push(GovernanceEvent::NativeTransferred {
                    from: ctx.caller,
                    to: treasury_address,
                    amount: ctx.value,
                });
            }

            let LedgerState {
                registry,
                assets,
                oracle,
                credit,
                tokens,
                treasury,
                ..
            } = state;
            let mut minter = RegistryMinter::new(credit, &*registry);
            let deposited = treasury.deposit(
                ctx,
                request,
                TreasuryPorts {
                    assets: &*assets,
                    prices: &*oracle,
                    tokens,
                    credit: &mut minter,
                },
            )?;
            events.push(GovernanceEvent::Deposited(deposited));
            Ok(events)
        })
    }

    // Voting

    pub fn propose(&mut self, caller: Address, description: impl Into<String>) -> RuntimeResult<CallReceipt> {
        let description = description.into();
        self.transact("voting.propose", caller, 0, |state, ctx| {
            let receipt = state.voting.propose(&ctx.caller, description, ctx.now)?;
            let mut events = Vec::with_capacity(2);
            if let Some(closed) = receipt.closed {
                events.push(GovernanceEvent::ProposalFinalized(closed));
            }
            events.push(GovernanceEvent::ProposalCreated(receipt.created));
            Ok(events)
        })
    }

    pub fn cast_vote(&mut self, caller: Address, choice: VoteChoice) -> RuntimeResult<CallReceipt> {
        self.transact("voting.cast_vote", caller, 0, |state, ctx| {
            let cast = state
                .voting
                .cast_vote(&ctx.caller, choice, &state.credit, ctx.now)?;
            Ok(vec![GovernanceEvent::VoteCast(cast)])
        })
    }

    pub fn finalize(&mut self, caller: Address) -> RuntimeResult<CallReceipt> {
        self.transact("voting.finalize", caller, 0, |state, ctx| {
            let finalized = state.voting.finalize(ctx.now)?;
            Ok(vec![GovernanceEvent::ProposalFinalized(finalized)])
        })
    }

    // Charity

    pub fn register_charity(&mut self, caller: Address, proof: Vec<u8>) -> RuntimeResult<CallReceipt> {
        self.transact("charity.register", caller, 0, |state, ctx| {
            let registered = state.charity.register(&ctx.caller, proof, ctx.now)?;
            Ok(vec![GovernanceEvent::Registered(registered)])
        })
    }

    pub fn verify_charity(&mut self, caller: Address, charity: Address) -> RuntimeResult<CallReceipt> {
        self.transact("charity.verify", caller, 0, |state, ctx| {
            let verified = state.charity.verify(&ctx.caller, &charity, ctx.now)?;
            Ok(vec![GovernanceEvent::Verified(verified)])
        })
    }

    fn transact<F>(&mut self, op: &'static str, caller: Address, value: Amount, f: F) -> RuntimeResult<CallReceipt>
    where
        F: FnOnce(&mut LedgerState, &CallContext) -> RuntimeResult<Vec<GovernanceEvent>>,
    {
        let ctx = CallContext::new(caller, self.clock.now()).with_value(value);
        let call_id = Uuid::new_v4();
        let span = info_span!("call", %call_id, op, caller = %caller, at = ctx.now.as_secs());
        let _entered = span.enter();

        let snapshot = self.state.clone();
        match f(&mut self.state, &ctx) {
            Ok(events) => {
                self.commit(call_id, ctx.now, &events);
                info!(events = events.len(), "Call committed");
                Ok(CallReceipt {
                    call_id,
                    caller,
                    at: ctx.now,
                    events,
                })
            }
            Err(err) => {
                self.state = snapshot;
                warn!(class = err.class().name(), error = %err, "Call reverted");
                Err(err)
            }
        }
    }

    fn commit(&mut self, call_id: Uuid, at: Timestamp, events: &[GovernanceEvent]) {
        let base = self.log.len() as u64;
        self.log.extend(events.iter().cloned().enumerate().map(|(i, event)| EventRecord {
            seq: base + i as u64,
            call_id,
            at,
            event,
        }));
    }
}

impl<C: Clock> std::fmt::Debug for GovernanceRuntime<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceRuntime")
            .field("owner", &self.owner)
            .field("addresses", &self.addresses)
            .field("events", &self.log.len())
            .finish_non_exhaustive()
    }
}
