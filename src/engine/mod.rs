pub mod account_model;
pub mod confirmations;
pub mod interest;
pub mod processor;
pub mod trading;
pub mod utxo;
pub mod validation;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::accounts::{Account, TransactionTarget};
use crate::core::errors::TxError;
use crate::core::money::{Currency, FiatCurrency, Money};
use crate::core::pending::{PendingTx, TxResult};
use crate::fees::level::FeeLevel;
use crate::fees::transitions::EngineFamily;
use crate::sources::ExchangeRates;

pub use account_model::AccountModelEngine;
pub use confirmations::{ConfirmationItem, ConfirmationKind};
pub use interest::{InterestDepositEngine, InterestWithdrawEngine};
pub use processor::TxProcessor;
pub use trading::TradingToAddressEngine;
pub use utxo::UtxoEngine;

/// The (source, target, rate-provider) triple an engine is bound to for
/// the lifetime of one transaction flow.
#[derive(Clone)]
pub struct EngineContext {
    pub source: Account,
    pub target: TransactionTarget,
    pub rates: Arc<dyn ExchangeRates>,
}

impl EngineContext {
    pub fn source_asset(&self) -> Currency {
        self.source.currency
    }

    pub fn user_fiat(&self) -> FiatCurrency {
        self.rates.user_fiat()
    }
}

/// The polymorphic contract every asset/product engine implements.
///
/// All `do_*` operations are pure functions of a `PendingTx` to a new
/// `PendingTx` (plus idempotent collaborator reads); `start` and `execute`
/// bind external context. One engine instance serves exactly one flow and
/// is never shared across concurrent flows.
#[async_trait]
pub trait TxEngine: Send + Sync {
    fn family(&self) -> EngineFamily;

    /// Binds the engine to a flow. Fails with a contract violation when the
    /// target's currency or kind does not fit this engine.
    fn start(
        &mut self,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<(), TxError>;

    /// Re-checks the `start` contract. A guard for calling code, not user
    /// feedback.
    fn assert_inputs_valid(&self) -> Result<(), TxError>;

    /// Builds the zero-valued `PendingTx`, reading the current balance and
    /// the saved fee-level preference. A failed fetch fails the whole
    /// initialisation; no partially-populated record is returned.
    async fn do_initialise_tx(&self) -> Result<PendingTx, TxError>;

    /// Recomputes fee and available balance for the current fee selection
    /// at a new amount.
    async fn do_update_amount(
        &self,
        amount: Money,
        pending: &PendingTx,
    ) -> Result<PendingTx, TxError>;

    /// Transitions the fee level. Legality is explicit per engine family;
    /// an illegal target level is a contract violation. The chosen level is
    /// persisted to the preference store only on success.
    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        level: FeeLevel,
        custom_amount: i64,
    ) -> Result<PendingTx, TxError>;

    /// Appends the engine's ordered confirmation items.
    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError>;

    /// Runs affordability and limit checks and stamps `validation_state`.
    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError>;

    /// Hands a fully-validated transaction to the signing/broadcast
    /// collaborator.
    async fn execute(
        &self,
        pending: &PendingTx,
        second_password: Option<&str>,
    ) -> Result<TxResult, TxError>;
}
