#![allow(dead_code)]

use govern_runtime::{GovernanceConfig, GovernanceRuntime};
use govern_types::{Address, Amount, AssetId, ManualClock, Timestamp};

pub const E18: Amount = 1_000_000_000_000_000_000;
pub const START: u64 = 1_700_000_000;

pub fn deployer() -> Address {
    Address::derive("deployer")
}

pub fn user() -> Address {
    Address::derive("user")
}

pub fn other() -> Address {
    Address::derive("other")
}

pub fn mock_token() -> AssetId {
    AssetId::token(Address::derive("mock-token"))
}

pub fn bootstrapped(config: &GovernanceConfig) -> GovernanceRuntime<ManualClock> {
    GovernanceRuntime::bootstrap(config, deployer(), ManualClock::new(Timestamp(START)))
        .expect("bootstrap")
}

/// Runtime with the native asset and the mock token listed and priced.
pub fn priced(native_price: Amount, token_price: Amount) -> GovernanceRuntime<ManualClock> {
    let mut rt = bootstrapped(&GovernanceConfig::development());
    rt.add_asset(deployer(), AssetId::NATIVE).unwrap();
    rt.add_asset(deployer(), mock_token()).unwrap();
    rt.set_quote(deployer(), AssetId::NATIVE, native_price, 18).unwrap();
    rt.set_quote(deployer(), mock_token(), token_price, 18).unwrap();
    rt.fund(user(), 10 * E18).unwrap();
    rt
}
