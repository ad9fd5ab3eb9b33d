//! Narrow interfaces to external collaborators.
//!
//! The engine performs no network I/O itself: balances, fee quotes,
//! exchange rates, product limits, preferences, and the signing/broadcast
//! boundary are all reached through these traits. Reads are idempotent and
//! may be retried by the caller; implementations must tolerate concurrent
//! readers across simultaneous transaction flows.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::accounts::{Account, AccountBalance};
use crate::core::errors::TxError;
use crate::core::money::{CryptoCurrency, Currency, ExchangeRate, FiatCurrency, Money};
use crate::fees::level::FeeLevel;
use crate::fees::quotes::{AccountFeeQuote, UtxoFeeQuote};

/// Asset-denominated balance lookups.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance_of(&self, account: &Account) -> Result<AccountBalance, TxError>;
}

/// Fee quotes for account-model chains.
#[async_trait]
pub trait AccountFeeOracle: Send + Sync {
    async fn fee_quote(&self, asset: CryptoCurrency) -> Result<AccountFeeQuote, TxError>;
}

/// Fee quotes for UTXO chains.
#[async_trait]
pub trait UtxoFeeOracle: Send + Sync {
    async fn fee_quote(&self, asset: CryptoCurrency) -> Result<UtxoFeeQuote, TxError>;
}

/// Outcome of coin selection for a concrete spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoSelection {
    pub absolute_fee: Money,
}

/// Outcome of a sweep estimate: what a full-balance spend would move and cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoSweep {
    pub max_spendable: Money,
    pub absolute_fee: Money,
}

/// Wrapper over an external coin-selection implementation.
#[async_trait]
pub trait UtxoSelector: Send + Sync {
    async fn select(
        &self,
        account: &Account,
        amount: Money,
        sat_per_byte: u64,
    ) -> Result<UtxoSelection, TxError>;

    async fn sweep(&self, account: &Account, sat_per_byte: u64) -> Result<UtxoSweep, TxError>;
}

/// Last-known exchange rates plus the user's display fiat.
pub trait ExchangeRates: Send + Sync {
    fn user_fiat(&self) -> FiatCurrency;

    fn rate(&self, from: Currency, to: Currency) -> Result<ExchangeRate, TxError>;
}

/// Per-asset last-chosen fee level. Read at initialise time, written only
/// on a successful fee-level transition.
pub trait FeeLevelStore: Send + Sync {
    fn saved_level(&self, asset: CryptoCurrency) -> Option<FeeLevel>;

    fn save_level(&self, asset: CryptoCurrency, level: FeeLevel);
}

/// Terms for depositing into a yield product. The minimum is
/// fiat-denominated and converted through the current exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositTerms {
    pub min_deposit: Money,
}

/// Terms for withdrawing: a crypto-denominated minimum plus the fee the
/// venue charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalTerms {
    pub min_withdrawal: Money,
    pub fee: Money,
}

/// Limits for yield-style products.
#[async_trait]
pub trait ProductLimitService: Send + Sync {
    async fn deposit_terms(&self, asset: CryptoCurrency) -> Result<DepositTerms, TxError>;

    async fn withdrawal_terms(&self, asset: CryptoCurrency) -> Result<WithdrawalTerms, TxError>;
}

/// Custodial venue operations for trading-balance flows.
#[async_trait]
pub trait CustodialService: Send + Sync {
    async fn withdraw_terms(&self, asset: CryptoCurrency) -> Result<WithdrawalTerms, TxError>;

    async fn transfer_funds(
        &self,
        amount: Money,
        fee: Money,
        destination: &str,
    ) -> Result<(), TxError>;
}

/// Fully-specified hand-off to the signing/broadcast collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub source: Account,
    pub destination: String,
    pub amount: Money,
    pub fee: Money,
    pub memo: Option<String>,
}

/// The execute boundary. The engine only hands off a validated transaction;
/// signing and broadcast live behind this trait.
#[async_trait]
pub trait TransactionBroadcaster: Send + Sync {
    async fn sign_and_broadcast(
        &self,
        request: BroadcastRequest,
        second_password: Option<&str>,
    ) -> Result<String, TxError>;
}
