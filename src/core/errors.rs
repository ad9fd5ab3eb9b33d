use thiserror::Error;

use crate::core::money::Currency;
use crate::core::pending::ValidationState;
use crate::fees::level::FeeLevel;

/// Error type for transaction construction.
///
/// Variants fall into two disjoint classes. Contract violations (engine
/// misuse by calling code) are never downgraded to a user-visible
/// `ValidationState`; affordability and limit shortfalls never surface here,
/// they are stamped onto the `PendingTx` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TxError {
    /// Engine operation invoked before `start`.
    #[error("engine used before start()")]
    NotStarted,

    /// No pending transaction yet; `initialise` has not run.
    #[error("transaction flow not initialised")]
    NotInitialised,

    /// Source account and transaction target disagree on the asset. A field
    /// named `source` would be picked up by thiserror as the error cause.
    #[error("asset mismatch: source {source_asset}, target {target_asset}")]
    AssetMismatch { source_asset: Currency, target_asset: Currency },

    /// The target kind is not one this engine can service.
    #[error("unsupported transaction target: {0}")]
    UnsupportedTarget(String),

    /// A fee-level transition outside the engine family's whitelist.
    #[error("illegal fee level transition: {from:?} -> {to:?}")]
    IllegalFeeLevelTransition { from: FeeLevel, to: FeeLevel },

    /// A fee level outside the selection's available set.
    #[error("fee level {0:?} is not available for this transaction")]
    FeeLevelUnavailable(FeeLevel),

    /// An amount or rate in the wrong currency reached an engine boundary.
    #[error("currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },

    /// `execute` requested while the transaction is not `CanExecute`.
    #[error("transaction is not executable in state {0:?}")]
    NotExecutable(ValidationState),

    /// Balance lookup failed at the network boundary.
    #[error("balance fetch failed: {0}")]
    BalanceFetch(String),

    /// Fee oracle quote failed at the network boundary.
    #[error("fee oracle failed: {0}")]
    FeeOracle(String),

    /// Product limit service failed; initialisation fails as a whole.
    #[error("product limits unavailable: {0}")]
    ProductLimits(String),

    /// No exchange rate between the requested pair.
    #[error("exchange rate unavailable: {from} -> {to}")]
    RateUnavailable { from: Currency, to: Currency },

    /// Coin selection could not produce a spend for the requested amount.
    #[error("utxo selection failed: {0}")]
    UtxoSelection(String),

    /// An amount left the representable range during conversion.
    #[error("amount out of representable range")]
    AmountOverflow,

    /// Signing or broadcast failed after a validated hand-off.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
}

impl TxError {
    /// True for programmer/contract violations, the non-recoverable class.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            TxError::NotStarted
                | TxError::NotInitialised
                | TxError::AssetMismatch { .. }
                | TxError::UnsupportedTarget(_)
                | TxError::IllegalFeeLevelTransition { .. }
                | TxError::FeeLevelUnavailable(_)
                | TxError::CurrencyMismatch { .. }
                | TxError::NotExecutable(_)
        )
    }

    /// True for idempotent-read failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TxError::BalanceFetch(_)
                | TxError::FeeOracle(_)
                | TxError::ProductLimits(_)
                | TxError::RateUnavailable { .. }
        )
    }
}
