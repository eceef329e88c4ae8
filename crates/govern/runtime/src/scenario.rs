//! Scripted runs against a fresh deployment on a manual clock.
//!
//! A scenario is a JSON document listing calls in order. Accounts are named by
//! label (`"alice"`), by role (`"deployer"`, `"treasury"`) or by `0x` address;
//! assets are `"native"` or an account-style token name. Amounts accept plain
//! integers or strings such as `"0.5e18"`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use govern_treasury::DepositRequest;
use govern_types::{Address, AddressParseError, Amount, AssetId, Clock, ManualClock, Timestamp};
use govern_voting::VoteChoice;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GovernanceConfig;
use crate::error::RuntimeError;
use crate::events::{CallReceipt, GovernanceEvent};
use crate::runtime::GovernanceRuntime;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid amount '{0}'")]
    Amount(String),

    #[error("invalid address '{input}': {source}")]
    Address {
        input: String,
        #[source]
        source: AddressParseError,
    },

    #[error("invalid proof hex: {0}")]
    Proof(#[from] hex::FromHexError),

    #[error("step {index} ({op}) failed: {source}")]
    Step {
        index: usize,
        op: &'static str,
        #[source]
        source: RuntimeError,
    },

    #[error("step {index} ({op}) succeeded but was expected to fail with '{expected}'")]
    UnexpectedSuccess {
        index: usize,
        op: &'static str,
        expected: String,
    },

    #[error("step {index} ({op}) failed with '{actual}', expected '{expected}'")]
    WrongError {
        index: usize,
        op: &'static str,
        expected: String,
        actual: String,
    },

    #[error("step {index}: {detail}")]
    Expectation { index: usize, detail: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    /// Clock reading at deployment, seconds since the epoch.
    #[serde(default = "default_start")]
    pub start: u64,

    #[serde(default = "default_deployer")]
    pub deployer: String,

    pub steps: Vec<Step>,
}

fn default_start() -> u64 {
    1_700_000_000
}

fn default_deployer() -> String {
    "deployer".to_string()
}

fn default_caller() -> String {
    "deployer".to_string()
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,

    /// Substring the step's error message must contain.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Integer or text amount.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountSpec {
    Units(u64),
    Text(String),
}

impl Default for AmountSpec {
    fn default() -> Self {
        Self::Units(0)
    }
}

impl AmountSpec {
    pub fn resolve(&self) -> Result<Amount, ScenarioError> {
        match self {
            Self::Units(n) => Ok(Amount::from(*n)),
            Self::Text(text) => parse_amount(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    Advance {
        secs: u64,
    },
    Fund {
        account: String,
        amount: AmountSpec,
    },
    AddAsset {
        #[serde(default = "default_caller")]
        from: String,
        asset: String,
    },
    SetQuote {
        #[serde(default = "default_caller")]
        from: String,
        asset: String,
        price: AmountSpec,
        decimals: u8,
    },
    MintTokens {
        #[serde(default = "default_caller")]
        from: String,
        asset: String,
        to: String,
        amount: AmountSpec,
    },
    /// Approve the treasury to pull `amount`.
    Approve {
        from: String,
        asset: String,
        amount: AmountSpec,
    },
    Deposit {
        from: String,
        asset: String,
        #[serde(default)]
        amount: AmountSpec,
        #[serde(default)]
        value: AmountSpec,
    },
    SetTreasury {
        #[serde(default = "default_caller")]
        from: String,
        treasury: String,
    },
    Propose {
        from: String,
        description: String,
    },
    Vote {
        from: String,
        choice: VoteChoice,
    },
    Finalize {
        from: String,
    },
    RegisterCharity {
        from: String,
        #[serde(default)]
        proof: String,
    },
    VerifyCharity {
        #[serde(default = "default_caller")]
        from: String,
        charity: String,
    },
    ExpectCredit {
        account: String,
        amount: AmountSpec,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Advance { .. } => "advance",
            Self::Fund { .. } => "fund",
            Self::AddAsset { .. } => "add_asset",
            Self::SetQuote { .. } => "set_quote",
            Self::MintTokens { .. } => "mint_tokens",
            Self::Approve { .. } => "approve",
            Self::Deposit { .. } => "deposit",
            Self::SetTreasury { .. } => "set_treasury",
            Self::Propose { .. } => "propose",
            Self::Vote { .. } => "vote",
            Self::Finalize { .. } => "finalize",
            Self::RegisterCharity { .. } => "register_charity",
            Self::VerifyCharity { .. } => "verify_charity",
            Self::ExpectCredit { .. } => "expect_credit",
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    pub at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<uuid::Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GovernanceEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: Option<String>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepReport>,
    /// Credit balance of every named account the scenario touched.
    pub credit: BTreeMap<String, Amount>,
    pub credit_supply: Amount,
    pub proposals_finalized: usize,
    pub proposal_running: bool,
}

/// Parse `"123"`, `"1e18"` or `"0.5e18"` into base units.
pub fn parse_amount(text: &str) -> Result<Amount, ScenarioError> {
    let invalid = || ScenarioError::Amount(text.to_string());
    let text = text.trim().replace('_', "");
    let (mantissa, exp) = match text.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<u32>().map_err(|_| invalid())?),
        None => (text.as_str(), 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    let frac_len = u32::try_from(frac_part.len()).map_err(|_| invalid())?;
    let shift = exp.checked_sub(frac_len).ok_or_else(invalid)?;
    let digits: Amount = format!("{}{}", int_part, frac_part)
        .parse()
        .map_err(|_| invalid())?;
    10u128
        .checked_pow(shift)
        .and_then(|scale| digits.checked_mul(scale))
        .ok_or_else(invalid)
}

struct Accounts {
    deployer: Address,
    treasury: Address,
    named: BTreeMap<String, Address>,
}

impl Accounts {
    fn resolve(&mut self, name: &str) -> Result<Address, ScenarioError> {
        match name {
            "deployer" | "owner" => Ok(self.deployer),
            "treasury" => Ok(self.treasury),
            _ if name.starts_with("0x") || name.starts_with("0X") => {
                name.parse().map_err(|source| ScenarioError::Address {
                    input: name.to_string(),
                    source,
                })
            }
            _ => {
                let address = Address::derive(name);
                self.named.insert(name.to_string(), address);
                Ok(address)
            }
        }
    }

    fn asset(&mut self, name: &str) -> Result<AssetId, ScenarioError> {
        if name == "native" {
            Ok(AssetId::NATIVE)
        } else {
            Ok(AssetId::token(self.resolve(name)?))
        }
    }
}

/// Deploy with `config`, run every step in order and report.
///
/// A step that fails without `expect_error` aborts the run, as does an
/// `expect_error` step that succeeds.
pub fn run_scenario(
    config: &GovernanceConfig,
    scenario: &Scenario,
) -> Result<ScenarioReport, ScenarioError> {
    let clock = ManualClock::new(Timestamp(scenario.start));
    let deployer = if scenario.deployer.starts_with("0x") {
        scenario
            .deployer
            .parse()
            .map_err(|source| ScenarioError::Address {
                input: scenario.deployer.clone(),
                source,
            })?
    } else {
        Address::derive(&scenario.deployer)
    };
    let mut rt = GovernanceRuntime::bootstrap(config, deployer, clock.clone()).map_err(|source| {
        ScenarioError::Step {
            index: 0,
            op: "bootstrap",
            source,
        }
    })?;
    let mut accounts = Accounts {
        deployer,
        treasury: rt.addresses().treasury,
        named: BTreeMap::new(),
    };
    info!(name = ?scenario.name, steps = scenario.steps.len(), "Running scenario");

    let mut reports = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let op = step.action.name();
        let result = apply(&mut rt, &clock, &mut accounts, index, &step.action)?;
        debug!(index, op, ok = result.is_ok(), "Step applied");

        let report = match (result, &step.expect_error) {
            (Ok(receipt), None) => StepReport {
                index,
                op,
                at: receipt.as_ref().map(|r| r.at).unwrap_or_else(|| clock.now()),
                call_id: receipt.as_ref().map(|r| r.call_id),
                events: receipt.map(|r| r.events).unwrap_or_default(),
                error: None,
            },
            (Ok(_), Some(expected)) => {
                return Err(ScenarioError::UnexpectedSuccess {
                    index,
                    op,
                    expected: expected.clone(),
                })
            }
            (Err(source), None) => return Err(ScenarioError::Step { index, op, source }),
            (Err(err), Some(expected)) => {
                let actual = err.to_string();
                if !actual.contains(expected.as_str()) {
                    return Err(ScenarioError::WrongError {
                        index,
                        op,
                        expected: expected.clone(),
                        actual,
                    });
                }
                StepReport {
                    index,
                    op,
                    at: clock.now(),
                    call_id: None,
                    events: Vec::new(),
                    error: Some(actual),
                }
            }
        };
        reports.push(report);
    }

    let state = rt.state();
    let credit = accounts
        .named
        .iter()
        .map(|(name, address)| (name.clone(), state.credit().balance_of(address)))
        .collect();
    Ok(ScenarioReport {
        name: scenario.name.clone(),
        finished_at: clock.now().to_datetime(),
        steps: reports,
        credit,
        credit_supply: state.credit().total_supply(),
        proposals_finalized: state.voting().history().len(),
        proposal_running: state.voting().current().is_some(),
    })
}

/// Apply one action. Outer error: the scenario itself is malformed or an
/// expectation failed. Inner error: the call reverted.
fn apply(
    rt: &mut GovernanceRuntime<ManualClock>,
    clock: &ManualClock,
    accounts: &mut Accounts,
    index: usize,
    action: &Action,
) -> Result<Result<Option<CallReceipt>, RuntimeError>, ScenarioError> {
    let receipt = match action {
        Action::Advance { secs } => {
            clock.advance(*secs);
            return Ok(Ok(None));
        }
        Action::ExpectCredit { account, amount } => {
            let who = accounts.resolve(account)?;
            let expected = amount.resolve()?;
            let actual = rt.credit_balance(&who);
            if actual != expected {
                return Err(ScenarioError::Expectation {
                    index,
                    detail: format!("credit of {} is {}, expected {}", account, actual, expected),
                });
            }
            return Ok(Ok(None));
        }
        Action::Fund { account, amount } => {
            let who = accounts.resolve(account)?;
            rt.fund(who, amount.resolve()?)
        }
        Action::AddAsset { from, asset } => {
            let caller = accounts.resolve(from)?;
            let asset = accounts.asset(asset)?;
            rt.add_asset(caller, asset)
        }
        Action::SetQuote {
            from,
            asset,
            price,
            decimals,
        } => {
            let caller = accounts.resolve(from)?;
            let asset = accounts.asset(asset)?;
            rt.set_quote(caller, asset, price.resolve()?, *decimals)
        }
        Action::MintTokens {
            from,
            asset,
            to,
            amount,
        } => {
            let caller = accounts.resolve(from)?;
            let asset = accounts.asset(asset)?;
            let to = accounts.resolve(to)?;
            rt.mint_tokens(caller, asset, to, amount.resolve()?)
        }
        Action::Approve {
            from,
            asset,
            amount,
        } => {
            let caller = accounts.resolve(from)?;
            let asset = accounts.asset(asset)?;
            let spender = rt.addresses().treasury;
            rt.approve(caller, asset, spender, amount.resolve()?)
        }
        Action::Deposit {
            from,
            asset,
            amount,
            value,
        } => {
            let caller = accounts.resolve(from)?;
            let asset = accounts.asset(asset)?;
            let request = DepositRequest {
                asset,
                amount: amount.resolve()?,
            };
            rt.deposit(caller, request, value.resolve()?)
        }
        Action::SetTreasury { from, treasury } => {
            let caller = accounts.resolve(from)?;
            let treasury = accounts.resolve(treasury)?;
            rt.set_governance_treasury(caller, treasury)
        }
        Action::Propose { from, description } => {
            let caller = accounts.resolve(from)?;
            rt.propose(caller, description.clone())
        }
        Action::Vote { from, choice } => {
            let caller = accounts.resolve(from)?;
            rt.cast_vote(caller, *choice)
        }
        Action::Finalize { from } => {
            let caller = accounts.resolve(from)?;
            rt.finalize(caller)
        }
        Action::RegisterCharity { from, proof } => {
            let caller = accounts.resolve(from)?;
            let body = proof.strip_prefix("0x").unwrap_or(proof);
            rt.register_charity(caller, hex::decode(body)?)
        }
        Action::VerifyCharity { from, charity } => {
            let caller = accounts.resolve(from)?;
            let charity = accounts.resolve(charity)?;
            rt.verify_charity(caller, charity)
        }
    };
    Ok(receipt.map(Some))
}
