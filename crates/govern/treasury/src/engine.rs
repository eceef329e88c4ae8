use std::collections::BTreeMap;

use govern_types::{
    Address, Amount, AssetDirectory, AssetId, CallContext, CreditIssuer, PriceQuote, PriceSource,
    TokenLedger,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conversion::credit_for;
use crate::error::TreasuryError;

/// Collaborator capabilities the engine borrows for one call.
pub struct TreasuryPorts<'a> {
    pub assets: &'a dyn AssetDirectory,
    pub prices: &'a dyn PriceSource,
    pub tokens: &'a mut dyn TokenLedger,
    pub credit: &'a mut dyn CreditIssuer,
}

/// A deposit as requested by the caller.
///
/// For the native asset `amount` may be zero (the attached value is used) or
/// must equal the attached value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub asset: AssetId,
    pub amount: Amount,
}

impl DepositRequest {
    pub fn native() -> Self {
        Self {
            asset: AssetId::NATIVE,
            amount: 0,
        }
    }

    pub fn token(asset: AssetId, amount: Amount) -> Self {
        Self { asset, amount }
    }
}

/// Emitted for every successful deposit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub depositor: Address,
    pub asset: AssetId,
    pub quantity: Amount,
    pub credit: Amount,
    pub quote: PriceQuote,
}

/// Treasury Conversion Engine.
///
/// Accepts any registered asset and mints internal credit to the depositor at
/// `floor(quantity × 10^decimals / price)`. All validation (asset membership,
/// attached value, quote, conversion, mint authorization, accounting
/// overflow) completes before the first effect, so a rejected deposit leaves
/// every ledger untouched.
#[derive(Clone, Debug)]
pub struct TreasuryEngine {
    address: Address,
    holdings: BTreeMap<AssetId, Amount>,
    credit_issued: Amount,
    deposits: u64,
}

impl TreasuryEngine {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            holdings: BTreeMap::new(),
            credit_issued: 0,
            deposits: 0,
        }
    }

    /// The address tokens are pulled to and mints are requested from.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Units of `asset` received through deposits.
    pub fn holdings(&self, asset: &AssetId) -> Amount {
        self.holdings.get(asset).copied().unwrap_or(0)
    }

    pub fn all_holdings(&self) -> impl Iterator<Item = (&AssetId, &Amount)> {
        self.holdings.iter()
    }

    /// Sum of every credit amount this engine has minted.
    pub fn credit_issued(&self) -> Amount {
        self.credit_issued
    }

    pub fn deposit_count(&self) -> u64 {
        self.deposits
    }

    /// Credit a deposit of `quantity` units of `asset` would yield right now.
    pub fn quote_credit(
        &self,
        assets: &dyn AssetDirectory,
        prices: &dyn PriceSource,
        asset: AssetId,
        quantity: Amount,
    ) -> Result<Amount, TreasuryError> {
        if !assets.contains(&asset) {
            return Err(TreasuryError::UnsupportedAsset(asset));
        }
        let quote = prices
            .quote(&asset)
            .ok_or(TreasuryError::InvalidPrice(asset))?;
        credit_for(asset, quantity, quote)
    }

    pub fn deposit(
        &mut self,
        ctx: &CallContext,
        request: DepositRequest,
        mut ports: TreasuryPorts<'_>,
    ) -> Result<Deposited, TreasuryError> {
        let asset = request.asset;
        let depositor = ctx.caller;

        if !ports.assets.contains(&asset) {
            warn!(asset = %asset, depositor = %depositor, "Deposit of unsupported asset rejected");
            return Err(TreasuryError::UnsupportedAsset(asset));
        }

        let quantity = deposit_quantity(ctx, request)?;
        if quantity == 0 {
            return Err(TreasuryError::EmptyDeposit(asset));
        }

        let quote = match ports.prices.quote(&asset) {
            Some(quote) if quote.price > 0 => quote,
            _ => {
                warn!(asset = %asset, "No usable price quote");
                return Err(TreasuryError::InvalidPrice(asset));
            }
        };
        let credit = credit_for(asset, quantity, quote)?;

        let holdings = self
            .holdings(&asset)
            .checked_add(quantity)
            .ok_or_else(|| TreasuryError::ArithmeticOverflow(format!("holdings of {}", asset)))?;
        let credit_issued = self
            .credit_issued
            .checked_add(credit)
            .ok_or_else(|| TreasuryError::ArithmeticOverflow("credit issued".into()))?;
        ports
            .credit
            .check_mint(&self.address, &depositor, credit)
            .map_err(TreasuryError::MintRejected)?;

        debug!(
            asset = %asset,
            quantity = quantity,
            price = quote.price,
            decimals = quote.decimals,
            credit = credit,
            "Deposit validated"
        );

        // Effects. Native value was moved by the substrate along with the call.
        if !asset.is_native() {
            ports
                .tokens
                .transfer_from(&asset, &self.address, &depositor, &self.address, quantity)
                .map_err(|source| TreasuryError::TransferFailed { asset, source })?;
        }
        ports
            .credit
            .mint(&self.address, &depositor, credit)
            .map_err(TreasuryError::MintRejected)?;

        self.holdings.insert(asset, holdings);
        self.credit_issued = credit_issued;
        self.deposits += 1;

        info!(
            depositor = %depositor,
            asset = %asset,
            quantity = quantity,
            credit = credit,
            "Deposit converted to credit"
        );

        Ok(Deposited {
            depositor,
            asset,
            quantity,
            credit,
            quote,
        })
    }
}

/// Units actually deposited, reconciling the declared amount with attached value.
fn deposit_quantity(ctx: &CallContext, request: DepositRequest) -> Result<Amount, TreasuryError> {
    let mismatch = || TreasuryError::NativeValueMismatch {
        asset: request.asset,
        amount: request.amount,
        attached: ctx.value,
    };
    if request.asset.is_native() {
        if request.amount != 0 && request.amount != ctx.value {
            return Err(mismatch());
        }
        Ok(ctx.value)
    } else {
        if ctx.value != 0 {
            return Err(mismatch());
        }
        Ok(request.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govern_registry::{
        AddressRegistry, AssetRegistry, CreditToken, PriceOracle, RegistryMinter, RoleAssignments,
        TokenBank,
    };
    use govern_types::{LedgerError, Timestamp};

    const E18: Amount = 1_000_000_000_000_000_000;

    fn deployer() -> Address {
        Address::derive("deployer")
    }

    fn user() -> Address {
        Address::derive("user")
    }

    fn treasury_addr() -> Address {
        Address::derive("treasury")
    }

    fn mock_token() -> AssetId {
        AssetId::token(Address::derive("mock-token"))
    }

    struct Fixture {
        registry: AddressRegistry,
        assets: AssetRegistry,
        oracle: PriceOracle,
        credit: CreditToken,
        tokens: TokenBank,
        engine: TreasuryEngine,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = AddressRegistry::new(deployer());
            registry
                .init(
                    &deployer(),
                    RoleAssignments {
                        token_issuer: Address::derive("credit"),
                        charity_manager: Address::derive("charity"),
                        voter: Address::derive("voting"),
                        treasury: treasury_addr(),
                        asset_list: Address::derive("assets"),
                    },
                )
                .unwrap();

            let mut assets = AssetRegistry::new(deployer());
            assets.add(&deployer(), mock_token()).unwrap();
            assets.add(&deployer(), AssetId::NATIVE).unwrap();

            let mut oracle = PriceOracle::new(deployer());
            oracle.set_quote(&deployer(), mock_token(), 2 * E18, 18).unwrap();
            oracle.set_quote(&deployer(), AssetId::NATIVE, 2 * E18, 18).unwrap();

            let mut tokens = TokenBank::new(deployer());
            tokens.mint(&deployer(), mock_token(), &user(), E18).unwrap();

            Self {
                registry,
                assets,
                oracle,
                credit: CreditToken::new("Governance Credit", "GCR"),
                tokens,
                engine: TreasuryEngine::new(treasury_addr()),
            }
        }

        fn deposit(&mut self, value: Amount, request: DepositRequest) -> Result<Deposited, TreasuryError> {
            let ctx = CallContext::new(user(), Timestamp(1)).with_value(value);
            let mut minter = RegistryMinter::new(&mut self.credit, &self.registry);
            self.engine.deposit(
                &ctx,
                request,
                TreasuryPorts {
                    assets: &self.assets,
                    prices: &self.oracle,
                    tokens: &mut self.tokens,
                    credit: &mut minter,
                },
            )
        }
    }

    #[test]
    fn native_deposit_uses_attached_value() {
        let mut fx = Fixture::new();
        let event = fx.deposit(E18 / 2, DepositRequest::native()).unwrap();
        assert_eq!(event.quantity, E18 / 2);
        assert_eq!(event.credit, E18 / 4);
        assert_eq!(fx.credit.balance_of(&user()), E18 / 4);
        assert_eq!(fx.engine.holdings(&AssetId::NATIVE), E18 / 2);
    }

    #[test]
    fn native_amount_must_match_value() {
        let mut fx = Fixture::new();
        assert!(fx
            .deposit(E18 / 2, DepositRequest::token(AssetId::NATIVE, E18 / 2))
            .is_ok());
        assert_eq!(
            fx.deposit(E18 / 2, DepositRequest::token(AssetId::NATIVE, E18)),
            Err(TreasuryError::NativeValueMismatch {
                asset: AssetId::NATIVE,
                amount: E18,
                attached: E18 / 2,
            })
        );
    }

    #[test]
    fn token_deposit_pulls_exact_amount() {
        let mut fx = Fixture::new();
        fx.tokens
            .increase_allowance(&user(), mock_token(), &treasury_addr(), E18)
            .unwrap();

        let event = fx.deposit(0, DepositRequest::token(mock_token(), E18)).unwrap();
        assert_eq!(event.credit, E18 / 2);
        assert_eq!(fx.tokens.balance_of(&mock_token(), &user()), 0);
        assert_eq!(fx.tokens.balance_of(&mock_token(), &treasury_addr()), E18);
        assert_eq!(fx.credit.balance_of(&user()), E18 / 2);
        assert_eq!(fx.engine.credit_issued(), E18 / 2);
        assert_eq!(fx.engine.deposit_count(), 1);
    }

    #[test]
    fn token_deposit_with_attached_value_rejected() {
        let mut fx = Fixture::new();
        fx.tokens
            .increase_allowance(&user(), mock_token(), &treasury_addr(), E18)
            .unwrap();
        assert!(matches!(
            fx.deposit(1, DepositRequest::token(mock_token(), E18)),
            Err(TreasuryError::NativeValueMismatch { .. })
        ));
        assert_eq!(fx.tokens.balance_of(&mock_token(), &user()), E18);
    }

    #[test]
    fn unsupported_asset_changes_nothing() {
        let mut fx = Fixture::new();
        let stranger = AssetId::token(Address::derive("unlisted"));
        assert_eq!(
            fx.deposit(0, DepositRequest::token(stranger, 10)),
            Err(TreasuryError::UnsupportedAsset(stranger))
        );
        assert_eq!(fx.credit.total_supply(), 0);
        assert_eq!(fx.engine.deposit_count(), 0);
    }

    #[test]
    fn missing_allowance_is_transfer_failure() {
        let mut fx = Fixture::new();
        let err = fx
            .deposit(0, DepositRequest::token(mock_token(), E18))
            .unwrap_err();
        assert!(matches!(
            err,
            TreasuryError::TransferFailed {
                source: LedgerError::InsufficientAllowance { .. },
                ..
            }
        ));
        assert_eq!(fx.credit.total_supply(), 0);
        assert_eq!(fx.engine.holdings(&mock_token()), 0);
    }

    #[test]
    fn zero_price_rejected_before_effects() {
        let mut fx = Fixture::new();
        fx.oracle.set_price(&deployer(), mock_token(), 0).unwrap();
        fx.tokens
            .increase_allowance(&user(), mock_token(), &treasury_addr(), E18)
            .unwrap();
        assert_eq!(
            fx.deposit(0, DepositRequest::token(mock_token(), E18)),
            Err(TreasuryError::InvalidPrice(mock_token()))
        );
        assert_eq!(fx.tokens.balance_of(&mock_token(), &user()), E18);
        assert_eq!(
            fx.tokens.allowance(&mock_token(), &user(), &treasury_addr()),
            E18
        );
    }

    #[test]
    fn empty_deposit_rejected() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.deposit(0, DepositRequest::native()),
            Err(TreasuryError::EmptyDeposit(AssetId::NATIVE))
        );
    }

    #[test]
    fn unauthorized_treasury_cannot_mint_or_pull() {
        let mut fx = Fixture::new();
        fx.engine = TreasuryEngine::new(Address::derive("rogue-treasury"));
        fx.tokens
            .increase_allowance(&user(), mock_token(), &Address::derive("rogue-treasury"), E18)
            .unwrap();
        let err = fx
            .deposit(0, DepositRequest::token(mock_token(), E18))
            .unwrap_err();
        assert!(matches!(
            err,
            TreasuryError::MintRejected(LedgerError::MinterNotAuthorized { .. })
        ));
        assert_eq!(fx.tokens.balance_of(&mock_token(), &user()), E18);
    }

    #[test]
    fn quote_credit_is_read_only() {
        let fx = Fixture::new();
        let preview = fx
            .engine
            .quote_credit(&fx.assets, &fx.oracle, mock_token(), E18)
            .unwrap();
        assert_eq!(preview, E18 / 2);
        assert_eq!(fx.engine.deposit_count(), 0);
    }
}
