//! Engine for withdrawing a custodial trading balance to an on-chain
//! address. The venue absorbs network-fee choice, so the only fee level is
//! `None` and the fee shown is the venue's withdrawal charge.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::accounts::{Account, AccountKind, TransactionTarget};
use crate::core::errors::TxError;
use crate::core::limits::TxLimits;
use crate::core::money::{CryptoCurrency, Money};
use crate::core::pending::{PendingTx, TxResult};
use crate::engine::confirmations::{send_confirmations, ConfirmationItem};
use crate::engine::validation;
use crate::engine::{EngineContext, TxEngine};
use crate::fees::level::{FeeLevel, FeeSelection};
use crate::fees::transitions::{EngineFamily, TRADING_TRANSITIONS};
use crate::sources::{BalanceSource, CustodialService, ExchangeRates};

/// Key under which a user-entered memo is threaded between updates.
const MEMO_KEY: &str = "memo";

/// Longest memo the memo-bearing chains accept.
const MEMO_MAX_LEN: usize = 28;

/// Custodial-balance withdrawals to an external address.
pub struct TradingToAddressEngine {
    balances: Arc<dyn BalanceSource>,
    custodial: Arc<dyn CustodialService>,
    ctx: Option<EngineContext>,
}

impl TradingToAddressEngine {
    pub fn new(balances: Arc<dyn BalanceSource>, custodial: Arc<dyn CustodialService>) -> Self {
        Self { balances, custodial, ctx: None }
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

    /// The memo attached to this flow: an explicit user entry wins over one
    /// embedded in the destination address.
    fn memo<'a>(&'a self, pending: &'a PendingTx) -> Option<&'a str> {
        pending
            .engine_state(MEMO_KEY)
            .and_then(|v| v.as_str())
            .or_else(|| self.ctx.as_ref().and_then(|ctx| ctx.target.memo()))
    }
}

#[async_trait]
impl TxEngine for TradingToAddressEngine {
    fn family(&self) -> EngineFamily {
        EngineFamily::Trading
    }

    fn start(
        &mut self,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<(), TxError> {
        if source.kind != AccountKind::Trading {
            return Err(TxError::UnsupportedTarget(
                "trading engine spends from a trading balance".into(),
            ));
        }
        if !matches!(target, TransactionTarget::Address(_)) {
            return Err(TxError::UnsupportedTarget(
                "trading engine withdraws to an on-chain address".into(),
            ));
        }
        if source.currency != target.currency() {
            return Err(TxError::AssetMismatch {
                source_asset: source.currency,
                target_asset: target.currency(),
            });
        }
        info!(asset = %source.currency, target = %target.label(), "starting trading withdrawal");
        self.ctx = Some(EngineContext { source, target, rates });
        Ok(())
    }

    fn assert_inputs_valid(&self) -> Result<(), TxError> {
        let ctx = self.ctx()?;
        if ctx.source.kind != AccountKind::Trading {
            return Err(TxError::UnsupportedTarget(
                "trading engine spends from a trading balance".into(),
            ));
        }
        if ctx.source.currency != ctx.target.currency() {
            return Err(TxError::AssetMismatch {
                source_asset: ctx.source.currency,
                target_asset: ctx.target.currency(),
            });
        }
        Ok(())
    }

    async fn do_initialise_tx(&self) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let asset = self.asset()?;
        let (balance, terms) = futures::try_join!(
            self.balances.balance_of(&ctx.source),
            self.custodial.withdraw_terms(asset),
        )?;

        let selection = FeeSelection::new(asset, FeeLevel::None, [FeeLevel::None].into())?
            .with_fees(BTreeMap::from([(FeeLevel::None, terms.fee)]));
        let available = balance.withdrawable.saturating_sub(&terms.fee);

        debug!(asset = %asset.ticker(), fee = %terms.fee, min = %terms.min_withdrawal,
            "initialised trading withdrawal");
        Ok(PendingTx::new(asset, ctx.user_fiat(), selection)
            .with_balances(balance.total, available)
            .with_fee(terms.fee, terms.fee)
            .with_limits(TxLimits::with_min_and_unlimited_max(terms.min_withdrawal)))
    }

    async fn do_update_amount(
        &self,
        amount: Money,
        pending: &PendingTx,
    ) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        if amount.currency() != ctx.source_asset() {
            return Err(TxError::CurrencyMismatch {
                expected: ctx.source_asset(),
                actual: amount.currency(),
            });
        }
        // Fee and limits are fixed by the venue at initialise time; only the
        // amount moves.
        Ok(pending.clone().with_amount(amount))
    }

    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        level: FeeLevel,
        _custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        self.ctx()?;
        TRADING_TRANSITIONS.check(pending.fee_selection.selected_level, level)?;
        Ok(pending.clone())
    }

    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let asset = self.asset()?;
        let mut items = send_confirmations(
            &ctx.source.label,
            ctx.source_asset(),
            &ctx.target.label(),
            &pending,
            ctx.rates.as_ref(),
        )?;
        if asset.supports_memo() {
            items.push(ConfirmationItem::Memo(self.memo(&pending).map(str::to_string)));
        }
        Ok(pending.with_confirmations(items))
    }

    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        let asset = self.asset()?;
        let extra = if asset.supports_memo() {
            validation::check_memo(self.memo(&pending), MEMO_MAX_LEN)
        } else {
            None
        };
        let state = validation::validate(&pending, extra);
        Ok(pending.with_validation_state(state))
    }

    async fn execute(
        &self,
        pending: &PendingTx,
        _second_password: Option<&str>,
    ) -> Result<TxResult, TxError> {
        let ctx = self.ctx()?;
        self.custodial
            .transfer_funds(pending.amount, pending.fee_amount, &ctx.target.label())
            .await?;
        info!(amount = %pending.amount, "withdrawal submitted");
        // The venue batches withdrawals and returns no transaction hash.
        Ok(TxResult::UnHashed { amount: pending.amount })
    }
}
