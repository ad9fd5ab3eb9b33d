//! Engine for account-model chains, where the fee is a product of a gas
//! limit and a per-unit gas price.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::accounts::{Account, TransactionTarget};
use crate::core::errors::TxError;
use crate::core::money::{CryptoCurrency, Money};
use crate::core::pending::{PendingTx, TxResult};
use crate::engine::confirmations::{send_confirmations, ConfirmationItem};
use crate::engine::validation;
use crate::engine::{EngineContext, TxEngine};
use crate::fees::level::{FeeLevel, FeeSelection};
use crate::fees::quotes::AccountFeeQuote;
use crate::fees::transitions::{EngineFamily, ACCOUNT_MODEL_TRANSITIONS};
use crate::sources::{
    AccountFeeOracle, BalanceSource, BroadcastRequest, ExchangeRates, FeeLevelStore,
    TransactionBroadcaster,
};

/// Minor units per quoted gas-price unit on 18-decimal chains.
const WEI_PER_GWEI: u128 = 1_000_000_000;

/// On-chain sends from a non-custodial account on a gas-priced chain.
///
/// Fee = `gas_limit(target) x price(level)`, where contract targets carry a
/// larger gas limit. Available levels are `{Regular, Priority}`; the fee is
/// amount-independent, so `fee_for_full_available` always equals the fee.
pub struct AccountModelEngine {
    balances: Arc<dyn BalanceSource>,
    fee_oracle: Arc<dyn AccountFeeOracle>,
    fee_prefs: Arc<dyn FeeLevelStore>,
    broadcaster: Arc<dyn TransactionBroadcaster>,
    note_supported: bool,
    ctx: Option<EngineContext>,
}

impl AccountModelEngine {
    pub fn new(
        balances: Arc<dyn BalanceSource>,
        fee_oracle: Arc<dyn AccountFeeOracle>,
        fee_prefs: Arc<dyn FeeLevelStore>,
        broadcaster: Arc<dyn TransactionBroadcaster>,
    ) -> Self {
        Self {
            balances,
            fee_oracle,
            fee_prefs,
            broadcaster,
            note_supported: true,
            ctx: None,
        }
    }

    pub fn with_note_supported(mut self, note_supported: bool) -> Self {
        self.note_supported = note_supported;
        self
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
        [FeeLevel::Regular, FeeLevel::Priority].into_iter().collect()
    }

    /// Absolute fee per level for the bound target, in minor units.
    fn fees_for_levels(
        &self,
        quote: &AccountFeeQuote,
        is_contract: bool,
    ) -> Result<BTreeMap<FeeLevel, Money>, TxError> {
        let asset = self.asset()?;
        let gas = quote.gas_limit_for(is_contract) as u128;
        let mut fees = BTreeMap::new();
        for level in Self::available_levels() {
            let minor = gas
                .checked_mul(quote.price_gwei(level) as u128)
                .and_then(|units| units.checked_mul(WEI_PER_GWEI))
                .ok_or(TxError::AmountOverflow)?;
            fees.insert(level, Money::from_minor(asset, minor));
        }
        Ok(fees)
    }
}

#[async_trait]
impl TxEngine for AccountModelEngine {
    fn family(&self) -> EngineFamily {
        EngineFamily::AccountModel
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
                    "account-model engine sends to addresses or product accounts".into(),
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
        info!(asset = %source.currency, target = %target.label(), "starting account-model flow");
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

        let levels = Self::available_levels();
        let saved = self
            .fee_prefs
            .saved_level(asset)
            .filter(|level| levels.contains(level))
            .unwrap_or(FeeLevel::Regular);
        let selection = FeeSelection::new(asset, saved, levels)?;

        debug!(asset = %asset.ticker(), level = ?saved, "initialised account-model transaction");
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

        // The gas limit is re-derived from the target on every update, so a
        // contract target is never priced with the plain-send limit.
        let (quote, balance) = futures::try_join!(
            self.fee_oracle.fee_quote(asset),
            self.balances.balance_of(&ctx.source),
        )?;
        let fees = self.fees_for_levels(&quote, ctx.target.is_contract())?;
        let selection = pending.fee_selection.clone().with_fees(fees);
        let fee = selection.selected_fee();
        let available = balance.withdrawable.saturating_sub(&fee);

        debug!(amount = %amount, fee = %fee, "updated amount");
        Ok(pending
            .clone()
            .with_amount(amount)
            .with_balances(balance.total, available)
            .with_fee(fee, fee)
            .with_fee_selection(selection))
    }

    async fn do_update_fee_level(
        &self,
        pending: &PendingTx,
        level: FeeLevel,
        _custom_amount: i64,
    ) -> Result<PendingTx, TxError> {
        let asset = self.asset()?;
        ACCOUNT_MODEL_TRANSITIONS.check(pending.fee_selection.selected_level, level)?;

        let selection = pending.fee_selection.clone().with_level(level)?;
        let moved = pending.clone().with_fee_selection(selection);
        let updated = self.do_update_amount(pending.amount, &moved).await?;

        // Persist only after the transition succeeded end to end.
        self.fee_prefs.save_level(asset, level);
        info!(asset = %asset.ticker(), level = ?level, "fee level changed");
        Ok(updated)
    }

    async fn do_build_confirmations(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        let ctx = self.ctx()?;
        let mut items = send_confirmations(
            &ctx.source.label,
            ctx.source_asset(),
            &ctx.target.label(),
            &pending,
            ctx.rates.as_ref(),
        )?;
        if self.note_supported {
            let note = pending
                .engine_state("description")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            items.push(ConfirmationItem::Description(note.to_string()));
        }
        Ok(pending.with_confirmations(items))
    }

    async fn do_validate(&self, pending: PendingTx) -> Result<PendingTx, TxError> {
        self.ctx()?;
        let state = validation::validate(&pending, None);
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
            memo: ctx.target.memo().map(str::to_string),
        };
        let tx_id = self.broadcaster.sign_and_broadcast(request, second_password).await?;
        info!(tx_id = %tx_id, amount = %pending.amount, "transaction broadcast");
        Ok(TxResult::Hashed { tx_id, amount: pending.amount })
    }
}
