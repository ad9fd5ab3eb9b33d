//! Transaction construction and fee selection for multi-asset wallets.
//!
//! `coinflow` is the pure computation layer between asset data sources and
//! a presentation layer: it resolves balances and fee quotes through narrow
//! async traits, computes currency-correct fee options per engine family,
//! enforces an explicit fee-level transition whitelist, validates
//! affordability and product limits, and produces an ordered confirmation
//! breakdown. It performs no network I/O, signing, or key management.

pub mod core;
pub mod engine;
pub mod fees;
pub mod sources;

pub use crate::core::{
    Account, AccountBalance, AccountKind, CryptoAddress, CryptoCurrency, Currency, ExchangeRate,
    FiatCurrency, Money, PendingTx, TransactionTarget, TxError, TxLimits, TxResult,
    ValidationState,
};
pub use crate::engine::{
    AccountModelEngine, ConfirmationItem, ConfirmationKind, InterestDepositEngine,
    InterestWithdrawEngine, TradingToAddressEngine, TxEngine, TxProcessor, UtxoEngine,
};
pub use crate::fees::{EngineFamily, FeeLevel, FeeSelection};
