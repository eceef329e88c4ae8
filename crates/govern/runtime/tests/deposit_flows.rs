//! Treasury deposits through the full runtime: native value, pulled tokens,
//! and the accounting that follows.

mod common;

use common::*;
use govern_runtime::{GovernanceEvent, RuntimeError};
use govern_treasury::{DepositRequest, TreasuryError};
use govern_types::{AssetId, LedgerError};

// ---------------------------------------------------------------------------
// Native deposits
// ---------------------------------------------------------------------------

#[test]
fn native_deposit_credits_attached_value() {
    let mut rt = priced(E18, 2 * E18);

    let receipt = rt
        .deposit(user(), DepositRequest::native(), E18 / 2)
        .unwrap();

    assert_eq!(rt.credit_balance(&user()), E18 / 2);
    assert_eq!(rt.state().native().balance_of(&user()), 10 * E18 - E18 / 2);
    assert_eq!(
        rt.state().native().balance_of(&rt.addresses().treasury),
        E18 / 2
    );
    assert_eq!(rt.state().treasury().holdings(&AssetId::NATIVE), E18 / 2);

    let names: Vec<&str> = receipt.events.iter().map(|e| e.name()).collect();
    assert_eq!(names, ["native_transferred", "deposited"]);
}

#[test]
fn native_and_token_deposits_accumulate() {
    let mut rt = priced(E18, 2 * E18);

    rt.deposit(user(), DepositRequest::native(), E18 / 2).unwrap();
    assert_eq!(rt.credit_balance(&user()), E18 / 2);

    rt.mint_tokens(deployer(), mock_token(), user(), E18).unwrap();
    let treasury = rt.addresses().treasury;
    rt.approve(user(), mock_token(), treasury, E18).unwrap();
    rt.deposit(user(), DepositRequest::token(mock_token(), E18), 0)
        .unwrap();

    // 0.5 native at 1.0 plus 1 token at 2.0.
    assert_eq!(rt.credit_balance(&user()), E18);
    assert_eq!(rt.state().tokens().balance_of(&mock_token(), &user()), 0);
    assert_eq!(rt.state().tokens().balance_of(&mock_token(), &treasury), E18);
    assert_eq!(rt.state().credit().total_supply(), E18);
    assert_eq!(rt.state().treasury().credit_issued(), E18);
    assert_eq!(rt.state().treasury().deposit_count(), 2);
}

#[test]
fn native_price_scales_credit() {
    let mut rt = priced(2 * E18, 2 * E18);
    rt.deposit(user(), DepositRequest::native(), E18 / 2).unwrap();
    assert_eq!(rt.credit_balance(&user()), E18 / 4);
}

#[test]
fn declared_native_amount_must_match_value() {
    let mut rt = priced(E18, E18);
    rt.deposit(user(), DepositRequest::token(AssetId::NATIVE, E18), E18)
        .unwrap();

    let err = rt
        .deposit(user(), DepositRequest::token(AssetId::NATIVE, E18), E18 / 2)
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Treasury(TreasuryError::NativeValueMismatch { .. })
    ));
    assert_eq!(rt.credit_balance(&user()), E18);
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn unlisted_asset_rejected() {
    let mut rt = bootstrapped(&govern_runtime::GovernanceConfig::development());
    rt.fund(user(), E18).unwrap();
    let err = rt.deposit(user(), DepositRequest::native(), 1).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Treasury(TreasuryError::UnsupportedAsset(AssetId::NATIVE))
    );
    assert_eq!(rt.state().native().balance_of(&user()), E18);
}

#[test]
fn token_deposit_without_allowance_rejected() {
    let mut rt = priced(E18, E18);
    rt.mint_tokens(deployer(), mock_token(), user(), E18).unwrap();

    let err = rt
        .deposit(user(), DepositRequest::token(mock_token(), E18), 0)
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Treasury(TreasuryError::TransferFailed {
            source: LedgerError::InsufficientAllowance { .. },
            ..
        })
    ));
    assert_eq!(rt.credit_balance(&user()), 0);
    assert_eq!(rt.state().treasury().deposit_count(), 0);
}

#[test]
fn token_deposit_with_attached_value_rejected_and_value_returned() {
    let mut rt = priced(E18, E18);
    rt.mint_tokens(deployer(), mock_token(), user(), E18).unwrap();
    let treasury = rt.addresses().treasury;
    rt.approve(user(), mock_token(), treasury, E18).unwrap();

    let err = rt
        .deposit(user(), DepositRequest::token(mock_token(), E18), 5)
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Treasury(TreasuryError::NativeValueMismatch { attached: 5, .. })
    ));
    assert_eq!(rt.state().native().balance_of(&user()), 10 * E18);
    assert_eq!(rt.state().native().balance_of(&treasury), 0);
    assert_eq!(rt.state().tokens().balance_of(&mock_token(), &user()), E18);
}

#[test]
fn unpriced_asset_rejected() {
    let mut rt = bootstrapped(&govern_runtime::GovernanceConfig::development());
    rt.add_asset(deployer(), AssetId::NATIVE).unwrap();
    rt.fund(user(), E18).unwrap();
    let err = rt.deposit(user(), DepositRequest::native(), E18).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Treasury(TreasuryError::InvalidPrice(AssetId::NATIVE))
    );
}

#[test]
fn zero_value_native_deposit_rejected() {
    let mut rt = priced(E18, E18);
    let err = rt.deposit(user(), DepositRequest::native(), 0).unwrap_err();
    assert_eq!(
        err,
        RuntimeError::Treasury(TreasuryError::EmptyDeposit(AssetId::NATIVE))
    );
}

#[test]
fn insufficient_native_balance_rejected() {
    let mut rt = priced(E18, E18);
    let err = rt
        .deposit(other(), DepositRequest::native(), E18)
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Native(LedgerError::InsufficientBalance { available: 0, .. })
    ));
}

// ---------------------------------------------------------------------------
// Treasury role
// ---------------------------------------------------------------------------

#[test]
fn deposit_fails_before_registry_init() {
    let mut rt = govern_runtime::GovernanceRuntime::deploy(
        &govern_runtime::GovernanceConfig::development(),
        deployer(),
        govern_types::ManualClock::new(govern_types::Timestamp(START)),
    );
    rt.add_asset(deployer(), AssetId::NATIVE).unwrap();
    rt.set_quote(deployer(), AssetId::NATIVE, E18, 18).unwrap();
    rt.fund(user(), E18).unwrap();

    let err = rt.deposit(user(), DepositRequest::native(), E18).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Treasury(TreasuryError::MintRejected(
            LedgerError::MinterNotAuthorized { .. }
        ))
    ));
    assert_eq!(rt.state().native().balance_of(&user()), E18);
}

#[test]
fn reassigned_treasury_role_stops_minting() {
    let mut rt = priced(E18, E18);
    rt.set_governance_treasury(deployer(), other()).unwrap();

    let err = rt.deposit(user(), DepositRequest::native(), E18).unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Treasury(TreasuryError::MintRejected(_))
    ));

    let treasury = rt.addresses().treasury;
    rt.set_governance_treasury(deployer(), treasury).unwrap();
    rt.deposit(user(), DepositRequest::native(), E18).unwrap();
    assert_eq!(rt.credit_balance(&user()), E18);
}

#[test]
fn deposit_events_reach_the_log() {
    let mut rt = priced(E18, E18);
    let before = rt.events().len();
    let receipt = rt.deposit(user(), DepositRequest::native(), E18).unwrap();
    let logged: Vec<_> = rt.events()[before..].iter().map(|r| &r.event).collect();
    assert_eq!(logged.len(), 2);
    match logged[1] {
        GovernanceEvent::Deposited(d) => {
            assert_eq!(d.depositor, user());
            assert_eq!(d.credit, E18);
        }
        unexpected => panic!("unexpected event {:?}", unexpected),
    }
    assert!(rt.events()[before..]
        .iter()
        .all(|r| r.call_id == receipt.call_id));
}
