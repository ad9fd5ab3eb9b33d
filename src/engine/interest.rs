//! Composite engines for interest-bearing product flows.
//!
//! Both engines own an inner engine and delegate amount and balance logic
//! to it verbatim; they layer product-specific limits on top, lock the fee
//! level to same-level no-ops, and replace the confirmation breakdown with
//! the product form.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::accounts::{Account, AccountKind, TransactionTarget};
use crate::core::errors::TxError;
use crate::core::limits::TxLimits;
use crate::core::money::{CryptoCurrency, Money};
use crate::core::pending::{PendingTx, TxResult};
use crate::engine::confirmations::product_confirmations;
use crate::engine::{EngineContext, TxEngine};
use crate::fees::level::FeeLevel;
use crate::fees::transitions::{EngineFamily, PRODUCT_TRANSITIONS};
use crate::sources::{ExchangeRates, ProductLimitService};

/// Raises the pending minimum to at least `floor`, keeping any existing max.
fn merge_min(limits: Option<&TxLimits>, floor: Money) -> TxLimits {
    match limits {
        Some(existing) => TxLimits { min: existing.min.max_with(&floor), max: existing.max },
        None => TxLimits::with_min_and_unlimited_max(floor),
    }
}

/// Deposits from a spendable account into an interest product.
///
/// The product minimum is fiat-denominated and converted through the
/// current exchange rate at initialise time; a limits-service failure fails
/// initialisation as a whole.
pub struct InterestDepositEngine {
    inner: Box<dyn TxEngine>,
    limits_service: Arc<dyn ProductLimitService>,
    ctx: Option<EngineContext>,
}

impl InterestDepositEngine {
    pub fn new(inner: Box<dyn TxEngine>, limits_service: Arc<dyn ProductLimitService>) -> Self {
        Self { inner, limits_service, ctx: None }
    }

    fn ctx(&self) -> Result<&EngineContext, TxError> {
        self.ctx.as_ref().ok_or(TxError::NotStarted)
    }

    fn asset(&self) -> Result<CryptoCurrency, TxError> {
        self.ctx()?
            .source_asset()
            .as_crypto()
            .ok_or_else(|| TxError::UnsupportedTarget("source must hold a crypto asset".into()))
    }
}

#[async_trait]
impl TxEngine for InterestDepositEngine {
    fn family(&self) -> EngineFamily {
        EngineFamily::Product
    }

    fn start(
        &mut self,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<(), TxError> {
        match &target {
            TransactionTarget::ProductAccount(account) if account.kind == AccountKind::Interest => {
            }
            _ => {
                return Err(TxError::UnsupportedTarget(
                    "interest deposits target an interest product account".into(),
                ))
            }
        }
        if source.currency != target.currency() {
            return Err(TxError::AssetMismatch {
                source_asset: source.currency,
                target_asset: target.currency(),
            });
        }
        self.inner.start(source.clone(), target.clone(), Arc::clone(&rates))?;
        info!(asset = %source.currency, "starting interest deposit");
        self.ctx = Some(EngineContext { source, target, rates });
        Ok(())
    }

    fn assert_inputs_valid(&self) -> Result<(), TxError> {
        let ctx = self.ctx()?;
        if ctx.source.currency != ctx.target.currency() {
            return Err(TxError::AssetMismatch {
                source_asset: ctx.source.currency,
                target_asset: ctx.target.currency(),
            });
        }
        self.inner.assert_inputs_valid()
    }

    async fn do_initialise_tx(&self) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let asset = self.asset()?;
        let pending = self.inner.do_initialise_tx().await?;

        let terms = self.limits_service.deposit_terms(asset).await?;
        let to_crypto = ctx
            .rates
            .rate(asset.into(), terms.min_deposit.currency())?
            .inverse()?;
        let min_crypto = to_crypto.convert(&terms.min_deposit)?;

        debug!(min = %min_crypto, "applied product deposit minimum");
        let limits = merge_min(pending.limits.as_ref(), min_crypto);
        Ok(pending.with_limits(limits))
    }

    async fn do_update_amount(
        &self,
        amount: Money,
        pending: &PendingTx,
    ) -> Result<PendingTx, TxError> {
        self.inner.do_update_amount(amount, pending).await
    }

    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        level: FeeLevel,
        _custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        self.ctx()?;
        // Same-level no-ops only; the inner engine is never consulted, so a
        // transition its family would accept is still rejected here.
        PRODUCT_TRANSITIONS.check(pending.fee_selection.selected_level, level)?;
        Ok(pending.clone())
    }

    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let items = product_confirmations(
            &ctx.source.label,
            ctx.source_asset(),
            &ctx.target.label(),
            &pending,
            ctx.rates.as_ref(),
        )?;
        Ok(pending.with_confirmations(items))
    }

    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        self.inner.do_validate(pending).await
    }

    async fn execute(
        &self,
        pending: &PendingTx,
        second_password: Option<&str>,
    ) -> Result<TxResult, TxError> {
        self.inner.execute(pending, second_password).await
    }
}

/// Withdrawals out of an interest product. The venue charges a fee and
/// imposes a crypto-denominated minimum, both merged into the inner
/// engine's pending transaction.
pub struct InterestWithdrawEngine {
    inner: Box<dyn TxEngine>,
    limits_service: Arc<dyn ProductLimitService>,
    ctx: Option<EngineContext>,
}

impl InterestWithdrawEngine {
    pub fn new(inner: Box<dyn TxEngine>, limits_service: Arc<dyn ProductLimitService>) -> Self {
        Self { inner, limits_service, ctx: None }
    }

    fn ctx(&self) -> Result<&EngineContext, TxError> {
        self.ctx.as_ref().ok_or(TxError::NotStarted)
    }

    fn asset(&self) -> Result<CryptoCurrency, TxError> {
        self.ctx()?
            .source_asset()
            .as_crypto()
            .ok_or_else(|| TxError::UnsupportedTarget("source must hold a crypto asset".into()))
    }
}

#[async_trait]
impl TxEngine for InterestWithdrawEngine {
    fn family(&self) -> EngineFamily {
        EngineFamily::Product
    }

    fn start(
        &mut self,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<(), TxError> {
        if source.kind != AccountKind::Interest {
            return Err(TxError::UnsupportedTarget(
                "interest withdrawals spend from an interest account".into(),
            ));
        }
        if source.currency != target.currency() {
            return Err(TxError::AssetMismatch {
                source_asset: source.currency,
                target_asset: target.currency(),
            });
        }
        self.inner.start(source.clone(), target.clone(), Arc::clone(&rates))?;
        info!(asset = %source.currency, "starting interest withdrawal");
        self.ctx = Some(EngineContext { source, target, rates });
        Ok(())
    }

    fn assert_inputs_valid(&self) -> Result<(), TxError> {
        let ctx = self.ctx()?;
        if ctx.source.kind != AccountKind::Interest {
            return Err(TxError::UnsupportedTarget(
                "interest withdrawals spend from an interest account".into(),
            ));
        }
        self.inner.assert_inputs_valid()
    }

    async fn do_initialise_tx(&self) -> Result<PendingTx, TxError> {
        let asset = self.asset()?;
        let pending = self.inner.do_initialise_tx().await?;

        let terms = self.limits_service.withdrawal_terms(asset).await?;
        let available = pending.available_balance.saturating_sub(&terms.fee);
        let limits = merge_min(pending.limits.as_ref(), terms.min_withdrawal);

        debug!(min = %terms.min_withdrawal, fee = %terms.fee, "applied withdrawal terms");
        Ok(pending
            .clone()
            .with_balances(pending.total_balance, available)
            .with_fee(terms.fee, terms.fee)
            .with_limits(limits))
    }

    async fn do_update_amount(
        &self,
        amount: Money,
        pending: &PendingTx,
    ) -> Result<PendingTx, TxError> {
        self.inner.do_update_amount(amount, pending).await
    }

    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        level: FeeLevel,
        _custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        self.ctx()?;
        PRODUCT_TRANSITIONS.check(pending.fee_selection.selected_level, level)?;
        Ok(pending.clone())
    }

    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let items = product_confirmations(
            &ctx.source.label,
            ctx.source_asset(),
            &ctx.target.label(),
            &pending,
            ctx.rates.as_ref(),
        )?;
        Ok(pending.with_confirmations(items))
    }

    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        self.inner.do_validate(pending).await
    }

    async fn execute(
        &self,
        pending: &PendingTx,
        second_password: Option<&str>,
    ) -> Result<TxResult, TxError> {
        self.inner.execute(pending, second_password).await
    }
}
