//! Engine for UTXO chains, where the fee falls out of coin selection at a
//! chosen sat/byte rate.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::core::accounts::{Account, TransactionTarget};
use crate::core::errors::TxError;
use crate::core::money::{CryptoCurrency, Money};
use crate::core::pending::{PendingTx, TxResult};
use crate::engine::confirmations::send_confirmations;
use crate::engine::validation;
use crate::engine::{EngineContext, TxEngine};
use crate::fees::level::{FeeLevel, FeeSelection};
use crate::fees::transitions::{EngineFamily, UTXO_TRANSITIONS};
use crate::sources::{
    BalanceSource, BroadcastRequest, ExchangeRates, FeeLevelStore, TransactionBroadcaster,
    UtxoFeeOracle, UtxoSelector,
};

/// Key under which the resolved sat/byte rate is threaded between updates.
const FEE_PER_BYTE_KEY: &str = "fee_per_byte";

/// On-chain sends from a non-custodial UTXO account.
///
/// Unlike the account-model family the fee depends on the amount (through
/// coin selection), so `fee_for_full_available` comes from a sweep estimate
/// rather than equalling the fee. Available levels are
/// `{Regular, Priority, Custom}`.
pub struct UtxoEngine {
    balances: Arc<dyn BalanceSource>,
    fee_oracle: Arc<dyn UtxoFeeOracle>,
    selector: Arc<dyn UtxoSelector>,
    fee_prefs: Arc<dyn FeeLevelStore>,
    broadcaster: Arc<dyn TransactionBroadcaster>,
    ctx: Option<EngineContext>,
}

impl UtxoEngine {
    pub fn new(
        balances: Arc<dyn BalanceSource>,
        fee_oracle: Arc<dyn UtxoFeeOracle>,
        selector: Arc<dyn UtxoSelector>,
        fee_prefs: Arc<dyn FeeLevelStore>,
        broadcaster: Arc<dyn TransactionBroadcaster>,
    ) -> Self {
        Self { balances, fee_oracle, selector, fee_prefs, broadcaster, ctx: None }
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

    fn available_levels() -> BTreeSet<FeeLevel> {
        [FeeLevel::Regular, FeeLevel::Priority, FeeLevel::Custom].into_iter().collect()
    }
}

#[async_trait]
impl TxEngine for UtxoEngine {
    fn family(&self) -> EngineFamily {
        EngineFamily::Utxo
    }

    fn start(
        &mut self,
        source: Account,
        target: TransactionTarget,
        rates: Arc<dyn ExchangeRates>,
    ) -> Result<(), TxError> {
        match &target {
            TransactionTarget::Address(_) | TransactionTarget::ProductAccount(_) => {}
            TransactionTarget::TradingAccount(_) => {
                return Err(TxError::UnsupportedTarget(
                    "utxo engine sends to addresses or product accounts".into(),
                ))
            }
        }
        if source.currency != target.currency() {
            return Err(TxError::AssetMismatch {
                source_asset: source.currency,
                target_asset: target.currency(),
            });
        }
        if source.currency.as_crypto().is_none() {
            return Err(TxError::UnsupportedTarget("source must hold a crypto asset".into()));
        }
        info!(asset = %source.currency, target = %target.label(), "starting utxo flow");
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
        Ok(())
    }

    async fn do_initialise_tx(&self) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let asset = self.asset()?;
        let balance = self.balances.balance_of(&ctx.source).await?;

        // A saved Custom level is not restored: the rate that made it valid
        // is gone, so the flow re-opens at Regular.
        let levels = Self::available_levels();
        let saved = self
            .fee_prefs
            .saved_level(asset)
            .filter(|level| levels.contains(level) && *level != FeeLevel::Custom)
            .unwrap_or(FeeLevel::Regular);
        let selection = FeeSelection::new(asset, saved, levels)?;

        debug!(asset = %asset.ticker(), level = ?saved, "initialised utxo transaction");
        Ok(PendingTx::new(asset, ctx.user_fiat(), selection)
            .with_balances(balance.total, balance.withdrawable))
    }

    async fn do_update_amount(
        &self,
        amount: Money,
        pending: &PendingTx,
    ) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let asset = self.asset()?;
        if amount.currency() != ctx.source_asset() {
            return Err(TxError::CurrencyMismatch {
                expected: ctx.source_asset(),
                actual: amount.currency(),
            });
        }

        let (quote, balance) = futures::try_join!(
            self.fee_oracle.fee_quote(asset),
            self.balances.balance_of(&ctx.source),
        )?;
        let selection = &pending.fee_selection;
        let rate = quote.sat_per_byte(selection.selected_level, selection.custom_amount);

        let sweep = self.selector.sweep(&ctx.source, rate).await?;

        // Every tier is priced so the presentation layer can render all
        // options, not just the selected one.
        let mut tiers = vec![FeeLevel::Regular, FeeLevel::Priority];
        if selection.selected_level == FeeLevel::Custom {
            tiers.push(FeeLevel::Custom);
        }
        let mut fees = BTreeMap::new();
        for level in tiers {
            let tier_rate = quote.sat_per_byte(level, selection.custom_amount);
            let tier_fee = if amount.is_zero() {
                Money::zero(asset)
            } else {
                self.selector.select(&ctx.source, amount, tier_rate).await?.absolute_fee
            };
            fees.insert(level, tier_fee);
        }
        let selection = selection.clone().with_fees(fees);
        let fee = selection.selected_fee();

        debug!(amount = %amount, fee = %fee, rate, "updated amount");
        Ok(pending
            .clone()
            .with_amount(amount)
            .with_balances(balance.total, sweep.max_spendable)
            .with_fee(fee, sweep.absolute_fee)
            .with_fee_selection(selection)
            .with_engine_state(FEE_PER_BYTE_KEY, json!(rate)))
    }

    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        level: FeeLevel,
        custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        let asset = self.asset()?;
        UTXO_TRANSITIONS.check(pending.fee_selection.selected_level, level)?;

        let mut selection = pending.fee_selection.clone().with_level(level)?;
        if level == FeeLevel::Custom {
            selection = selection.with_custom_amount(custom_amount);
        }
        let moved = pending.clone().with_fee_selection(selection);
        let updated = self.do_update_amount(pending.amount, &moved).await?;

        self.fee_prefs.save_level(asset, level);
        info!(asset = %asset.ticker(), level = ?level, "fee level changed");
        Ok(updated)
    }

    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let items = send_confirmations(
            &ctx.source.label,
            ctx.source_asset(),
            &ctx.target.label(),
            &pending,
            ctx.rates.as_ref(),
        )?;
        Ok(pending.with_confirmations(items))
    }

    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        self.ctx()?;
        let asset = self.asset()?;
        let selection = &pending.fee_selection;

        let extra = if selection.selected_level == FeeLevel::Custom {
            let quote = self.fee_oracle.fee_quote(asset).await?;
            validation::check_custom_fee(
                selection.selected_level,
                selection.custom_amount,
                &quote.bounds,
            )
        } else {
            None
        };

        let state = validation::validate(&pending, extra);
        Ok(pending.with_validation_state(state))
    }

    async fn execute(
        &self,
        pending: &PendingTx,
        second_password: Option<&str>,
    ) -> Result<TxResult, TxError> {
        let ctx = self.ctx()?;
        let request = BroadcastRequest {
            source: ctx.source.clone(),
            destination: ctx.target.label(),
            amount: pending.amount,
            fee: pending.fee_amount,
            memo: None,
        };
        let tx_id = self.broadcaster.sign_and_broadcast(request, second_password).await?;
        info!(tx_id = %tx_id, amount = %pending.amount, "transaction broadcast");
        Ok(TxResult::Hashed { tx_id, amount: pending.amount })
    }
}
