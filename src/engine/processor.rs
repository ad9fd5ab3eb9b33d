//! Single-writer driver for one transaction flow.
//!
//! The processor owns the engine and the one current `PendingTx`. Every
//! update takes the latest snapshot and replaces it with the engine's
//! result, so no two updates can race against the same prior state.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::core::accounts::{Account, TransactionTarget};
use crate::core::errors::TxError;
use crate::core::money::Money;
use crate::core::pending::{PendingTx, TxResult, ValidationState};
use crate::engine::TxEngine;
use crate::fees::level::FeeLevel;
use crate::sources::ExchangeRates;

pub struct TxProcessor {
    engine: Box<dyn TxEngine>,
    current: Option<PendingTx>,
}

impl TxProcessor {
    /// Binds the engine to a flow and checks its contract. The flow holds no
    /// pending transaction until `initialise` runs.
    pub fn new(
        mut engine: Box<dyn TxEngine>,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<Self, TxError> {
        engine.start(source, target, rates)?;
        engine.assert_inputs_valid()?;
        Ok(Self { engine, current: None })
    }

    pub fn current(&self) -> Result<&PendingTx, TxError> {
        self.current.as_ref().ok_or(TxError::NotInitialised)
    }

    fn store(&mut self, pending: PendingTx) -> PendingTx {
        self.current = Some(pending.clone());
        pending
    }

    /// Builds the initial zero-valued transaction. A collaborator failure
    /// leaves the flow uninitialised.
    pub async fn initialise(&mut self) -> Result<PendingTx, TxError> {
        let pending = self.engine.do_initialise_tx().await?;
        debug!(state = ?pending.validation_state, "flow initialised");
        Ok(self.store(pending))
    }

    /// Sets the amount, recomputes fees, and re-validates.
    pub async fn update_amount(&mut self, amount: Money) -> Result<PendingTx, TxError> {
        let current = self.current()?.clone();
        let updated = self.engine.do_update_amount(amount, &current).await?;
        let validated = self.engine.do_validate(updated).await?;
        Ok(self.store(validated))
    }

    /// Moves the fee level. An unavailable level is rejected before the
    /// engine sees it; an available-but-illegal transition is the engine
    /// family's contract violation.
    pub async fn update_fee_level(
        &mut self,
        level: FeeLevel,
        custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        let current = self.current()?.clone();
        if !current.fee_selection.available_levels.contains(&level) {
            return Err(TxError::FeeLevelUnavailable(level));
        }
        let updated = self.engine.do_update_fee_level(&current, level, custom_amount).await?;
        let validated = self.engine.do_validate(updated).await?;
        Ok(self.store(validated))
    }

    /// Attaches a user-entered memo and re-validates.
    pub async fn set_memo(&mut self, memo: impl Into<String>) -> Result<PendingTx, TxError> {
        let current = self.current()?.clone().with_engine_state("memo", json!(memo.into()));
        let validated = self.engine.do_validate(current).await?;
        Ok(self.store(validated))
    }

    /// Attaches a free-form note shown as a `Description` confirmation.
    pub async fn set_description(
        &mut self,
        description: impl Into<String>,
    ) -> Result<PendingTx, TxError> {
        let current =
            self.current()?.clone().with_engine_state("description", json!(description.into()));
        Ok(self.store(current))
    }

    /// Builds the ordered confirmation breakdown for the current snapshot.
    pub async fn build_confirmations(&mut self) -> Result<PendingTx, TxError> {
        let current = self.current()?.clone();
        let built = self.engine.do_build_confirmations(current).await?;
        Ok(self.store(built))
    }

    /// Re-validates and hands off. Anything short of `CanExecute` refuses
    /// with the state that blocked it.
    pub async fn execute(&mut self, second_password: Option<&str>) -> Result<TxResult, TxError> {
        let current = self.current()?.clone();
        let validated = self.engine.do_validate(current).await?;
        let validated = self.store(validated);
        if validated.validation_state != ValidationState::CanExecute {
            return Err(TxError::NotExecutable(validated.validation_state));
        }
        let result = self.engine.execute(&validated, second_password).await?;
        info!(amount = %result.amount(), "flow executed");
        Ok(result)
    }
}
