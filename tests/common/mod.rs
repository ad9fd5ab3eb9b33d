// Shared in-memory collaborators for the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use coinflow::core::accounts::{Account, AccountBalance, AccountKind, TransactionTarget};
use coinflow::core::errors::TxError;
use coinflow::core::money::{
    CryptoCurrency, Currency, ExchangeRate, FiatCurrency, Money,
};
use coinflow::core::pending::{PendingTx, TxResult};
use coinflow::engine::{EngineContext, TxEngine};
use coinflow::fees::level::FeeLevel;
use coinflow::fees::quotes::{AccountFeeQuote, UtxoFeeQuote};
use coinflow::fees::transitions::EngineFamily;
use coinflow::sources::{
    AccountFeeOracle, BalanceSource, BroadcastRequest, CustodialService, DepositTerms,
    ExchangeRates, FeeLevelStore, ProductLimitService, TransactionBroadcaster, UtxoFeeOracle,
    UtxoSelection, UtxoSelector, UtxoSweep, WithdrawalTerms,
};

pub const WEI_PER_GWEI: u128 = 1_000_000_000;
pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

/// Virtual transaction size the mock coin selector prices against.
pub const MOCK_TX_BYTES: u64 = 250;

pub fn eth(minor: u128) -> Money {
    Money::from_minor(CryptoCurrency::Eth, minor)
}

pub fn btc(minor: u128) -> Money {
    Money::from_minor(CryptoCurrency::Btc, minor)
}

pub fn usd(minor: u128) -> Money {
    Money::from_minor(FiatCurrency::Usd, minor)
}

pub fn eth_account() -> Account {
    Account::new("eth-1", "Private Key Wallet", CryptoCurrency::Eth, AccountKind::NonCustodial)
}

pub fn btc_account() -> Account {
    Account::new("btc-1", "Private Key Wallet", CryptoCurrency::Btc, AccountKind::NonCustodial)
}

pub fn interest_account(asset: CryptoCurrency) -> Account {
    Account::new("int-1", "Rewards Account", asset, AccountKind::Interest)
}

// ================================================================================
// Balance source
// ================================================================================

#[derive(Default)]
pub struct MockBalances {
    balances: Mutex<HashMap<String, AccountBalance>>,
    fail: Mutex<bool>,
}

impl MockBalances {
    pub fn with(account: &Account, balance: AccountBalance) -> Arc<Self> {
        let mock = Self::default();
        mock.balances.lock().insert(account.id.clone(), balance);
        Arc::new(mock)
    }

    pub fn set(&self, account: &Account, balance: AccountBalance) {
        self.balances.lock().insert(account.id.clone(), balance);
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl BalanceSource for MockBalances {
    async fn balance_of(&self, account: &Account) -> Result<AccountBalance, TxError> {
        if *self.fail.lock() {
            return Err(TxError::BalanceFetch("mock outage".into()));
        }
        self.balances
            .lock()
            .get(&account.id)
            .cloned()
            .ok_or_else(|| TxError::BalanceFetch(format!("unknown account {}", account.id)))
    }
}

/// Balance where the whole amount is spendable.
pub fn full_balance(amount: Money) -> AccountBalance {
    AccountBalance { total: amount, withdrawable: amount, pending: Money::zero(amount.currency()) }
}

// ================================================================================
// Fee oracles
// ================================================================================

pub struct MockAccountOracle {
    quote: Mutex<AccountFeeQuote>,
    fail: Mutex<bool>,
}

impl MockAccountOracle {
    pub fn with(quote: AccountFeeQuote) -> Arc<Self> {
        Arc::new(Self { quote: Mutex::new(quote), fail: Mutex::new(false) })
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl AccountFeeOracle for MockAccountOracle {
    async fn fee_quote(&self, _asset: CryptoCurrency) -> Result<AccountFeeQuote, TxError> {
        if *self.fail.lock() {
            return Err(TxError::FeeOracle("mock outage".into()));
        }
        Ok(*self.quote.lock())
    }
}

pub struct MockUtxoOracle {
    quote: Mutex<UtxoFeeQuote>,
}

impl MockUtxoOracle {
    pub fn with(quote: UtxoFeeQuote) -> Arc<Self> {
        Arc::new(Self { quote: Mutex::new(quote) })
    }
}

#[async_trait]
impl UtxoFeeOracle for MockUtxoOracle {
    async fn fee_quote(&self, _asset: CryptoCurrency) -> Result<UtxoFeeQuote, TxError> {
        Ok(*self.quote.lock())
    }
}

// ================================================================================
// Coin selection
// ================================================================================

/// Prices every spend as `sat_per_byte x MOCK_TX_BYTES` against a fixed
/// spendable balance.
pub struct MockSelector {
    spendable: Money,
}

impl MockSelector {
    pub fn with_spendable(spendable: Money) -> Arc<Self> {
        Arc::new(Self { spendable })
    }

    fn absolute_fee(&self, sat_per_byte: u64) -> Money {
        Money::from_minor(
            self.spendable.currency(),
            sat_per_byte as u128 * MOCK_TX_BYTES as u128,
        )
    }
}

#[async_trait]
impl UtxoSelector for MockSelector {
    async fn select(
        &self,
        _account: &Account,
        _amount: Money,
        sat_per_byte: u64,
    ) -> Result<UtxoSelection, TxError> {
        // Affordability is the validator's call; selection always prices.
        Ok(UtxoSelection { absolute_fee: self.absolute_fee(sat_per_byte) })
    }

    async fn sweep(&self, _account: &Account, sat_per_byte: u64) -> Result<UtxoSweep, TxError> {
        let fee = self.absolute_fee(sat_per_byte);
        Ok(UtxoSweep { max_spendable: self.spendable.saturating_sub(&fee), absolute_fee: fee })
    }
}

// ================================================================================
// Exchange rates
// ================================================================================

pub struct MockRates {
    fiat: FiatCurrency,
    rates: Mutex<HashMap<(Currency, Currency), Decimal>>,
}

impl MockRates {
    pub fn new(fiat: FiatCurrency) -> Arc<Self> {
        Arc::new(Self { fiat, rates: Mutex::new(HashMap::new()) })
    }

    /// 1 unit of `from` = `rate` units of `to`; the inverse is derived by
    /// the engine, not the provider.
    pub fn quote(
        self: Arc<Self>,
        from: impl Into<Currency>,
        to: impl Into<Currency>,
        rate: Decimal,
    ) -> Arc<Self> {
        self.rates.lock().insert((from.into(), to.into()), rate);
        self
    }
}

impl ExchangeRates for MockRates {
    fn user_fiat(&self) -> FiatCurrency {
        self.fiat
    }

    fn rate(&self, from: Currency, to: Currency) -> Result<ExchangeRate, TxError> {
        if from == to {
            return Ok(ExchangeRate::identity(from));
        }
        self.rates
            .lock()
            .get(&(from, to))
            .map(|rate| ExchangeRate::new(from, to, *rate))
            .ok_or(TxError::RateUnavailable { from, to })
    }
}

// ================================================================================
// Preference store and broadcaster
// ================================================================================

#[derive(Default)]
pub struct RecordingFeeStore {
    saved: Mutex<HashMap<CryptoCurrency, FeeLevel>>,
    writes: Mutex<Vec<(CryptoCurrency, FeeLevel)>>,
}

impl RecordingFeeStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn preset(asset: CryptoCurrency, level: FeeLevel) -> Arc<Self> {
        let store = Self::default();
        store.saved.lock().insert(asset, level);
        Arc::new(store)
    }

    pub fn writes(&self) -> Vec<(CryptoCurrency, FeeLevel)> {
        self.writes.lock().clone()
    }
}

impl FeeLevelStore for RecordingFeeStore {
    fn saved_level(&self, asset: CryptoCurrency) -> Option<FeeLevel> {
        self.saved.lock().get(&asset).copied()
    }

    fn save_level(&self, asset: CryptoCurrency, level: FeeLevel) {
        self.saved.lock().insert(asset, level);
        self.writes.lock().push((asset, level));
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    requests: Mutex<Vec<BroadcastRequest>>,
    fail: Mutex<bool>,
}

impl RecordingBroadcaster {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn requests(&self) -> Vec<BroadcastRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl TransactionBroadcaster for RecordingBroadcaster {
    async fn sign_and_broadcast(
        &self,
        request: BroadcastRequest,
        _second_password: Option<&str>,
    ) -> Result<String, TxError> {
        if *self.fail.lock() {
            return Err(TxError::ExecutionFailed("mock rejection".into()));
        }
        let mut requests = self.requests.lock();
        requests.push(request);
        Ok(format!("0xhash{:04}", requests.len()))
    }
}

// ================================================================================
// Custodial venue and product limits
// ================================================================================

pub struct MockCustodial {
    terms: WithdrawalTerms,
    transfers: Mutex<Vec<(Money, Money, String)>>,
}

impl MockCustodial {
    pub fn with_terms(terms: WithdrawalTerms) -> Arc<Self> {
        Arc::new(Self { terms, transfers: Mutex::new(Vec::new()) })
    }

    pub fn transfers(&self) -> Vec<(Money, Money, String)> {
        self.transfers.lock().clone()
    }
}

#[async_trait]
impl CustodialService for MockCustodial {
    async fn withdraw_terms(&self, _asset: CryptoCurrency) -> Result<WithdrawalTerms, TxError> {
        Ok(self.terms.clone())
    }

    async fn transfer_funds(
        &self,
        amount: Money,
        fee: Money,
        destination: &str,
    ) -> Result<(), TxError> {
        self.transfers.lock().push((amount, fee, destination.to_string()));
        Ok(())
    }
}

pub struct MockProductLimits {
    deposit: Option<DepositTerms>,
    withdrawal: Option<WithdrawalTerms>,
}

impl MockProductLimits {
    pub fn deposits(terms: DepositTerms) -> Arc<Self> {
        Arc::new(Self { deposit: Some(terms), withdrawal: None })
    }

    pub fn withdrawals(terms: WithdrawalTerms) -> Arc<Self> {
        Arc::new(Self { deposit: None, withdrawal: Some(terms) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { deposit: None, withdrawal: None })
    }
}

#[async_trait]
impl ProductLimitService for MockProductLimits {
    async fn deposit_terms(&self, _asset: CryptoCurrency) -> Result<DepositTerms, TxError> {
        self.deposit.clone().ok_or_else(|| TxError::ProductLimits("mock outage".into()))
    }

    async fn withdrawal_terms(&self, _asset: CryptoCurrency) -> Result<WithdrawalTerms, TxError> {
        self.withdrawal.clone().ok_or_else(|| TxError::ProductLimits("mock outage".into()))
    }
}

// ================================================================================
// Scripted inner engine for composite delegation tests
// ================================================================================

/// Records which operations the composite delegated and answers with
/// canned values.
pub struct StubEngine {
    pub initial: PendingTx,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
    ctx: Mutex<Option<EngineContext>>,
}

impl StubEngine {
    pub fn new(initial: PendingTx) -> Self {
        Self { initial, calls: Arc::new(Mutex::new(Vec::new())), ctx: Mutex::new(None) }
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().push(op);
    }
}

#[async_trait]
impl TxEngine for StubEngine {
    fn family(&self) -> EngineFamily {
        EngineFamily::AccountModel
    }

    fn start(
        &mut self,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<(), TxError> {
        self.record("start");
        *self.ctx.lock() = Some(EngineContext { source, target, rates });
        Ok(())
    }

    fn assert_inputs_valid(&self) -> Result<(), TxError> {
        self.record("assert_inputs_valid");
        Ok(())
    }

    async fn do_initialise_tx(&self) -> Result<PendingTx, TxError> {
        self.record("do_initialise_tx");
        Ok(self.initial.clone())
    }

    async fn do_update_amount(
        &self,
        amount: Money,
        pending: &PendingTx,
    ) -> Result<PendingTx, TxError> {
        self.record("do_update_amount");
        Ok(pending.clone().with_amount(amount))
    }

    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        _level: FeeLevel,
        _custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        self.record("do_update_fee_level");
        Ok(pending.clone())
    }

    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        self.record("do_build_confirmations");
        Ok(pending)
    }

    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        self.record("do_validate");
        let state = coinflow::engine::validation::validate(&pending, None);
        Ok(pending.with_validation_state(state))
    }

    async fn execute(
        &self,
        pending: &PendingTx,
        _second_password: Option<&str>,
    ) -> Result<TxResult, TxError> {
        self.record("execute");
        Ok(TxResult::Hashed { tx_id: "0xinner".into(), amount: pending.amount })
    }
}
