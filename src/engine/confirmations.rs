use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::TxError;
use crate::core::money::{Currency, Money};
use crate::core::pending::PendingTx;
use crate::fees::level::FeeLevel;
use crate::sources::ExchangeRates;

/// One typed line in the user-facing transaction summary. The order of
/// items in `PendingTx::confirmations` is significant for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfirmationItem {
    Created(DateTime<Utc>),
    From {
        label: String,
        asset: Currency,
    },
    To {
        label: String,
    },
    Amount {
        value: Money,
        exchange: Money,
    },
    NetworkFee {
        fee: Money,
        exchange: Money,
        asset: Currency,
        level: FeeLevel,
    },
    Total {
        total: Money,
        exchange: Money,
    },
    Description(String),
    Memo(Option<String>),
}

/// Discriminant for presence/order assertions without matching payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationKind {
    Created,
    From,
    To,
    Amount,
    NetworkFee,
    Total,
    Description,
    Memo,
}

impl ConfirmationItem {
    pub fn kind(&self) -> ConfirmationKind {
        match self {
            ConfirmationItem::Created(_) => ConfirmationKind::Created,
            ConfirmationItem::From { .. } => ConfirmationKind::From,
            ConfirmationItem::To { .. } => ConfirmationKind::To,
            ConfirmationItem::Amount { .. } => ConfirmationKind::Amount,
            ConfirmationItem::NetworkFee { .. } => ConfirmationKind::NetworkFee,
            ConfirmationItem::Total { .. } => ConfirmationKind::Total,
            ConfirmationItem::Description(_) => ConfirmationKind::Description,
            ConfirmationItem::Memo(_) => ConfirmationKind::Memo,
        }
    }
}

/// Converts a value into the user's selected fiat for display next to the
/// asset amount.
pub fn to_user_fiat(rates: &dyn ExchangeRates, value: &Money) -> Result<Money, TxError> {
    let fiat = rates.user_fiat();
    if value.currency() == Currency::Fiat(fiat) {
        return Ok(*value);
    }
    rates.rate(value.currency(), fiat.into())?.convert(value)
}

/// The standard send breakdown:
/// `[Created, From, To, Amount, NetworkFee, Total]`. The fee line is
/// omitted when the fee is zero.
pub fn send_confirmations(
    source_label: &str,
    source_asset: Currency,
    target_label: &str,
    pending: &PendingTx,
    rates: &dyn ExchangeRates,
) -> Result<Vec<ConfirmationItem>, TxError> {
    let total = pending.amount.checked_add(&pending.fee_amount)?;
    let mut items = vec![
        ConfirmationItem::Created(Utc::now()),
        ConfirmationItem::From { label: source_label.to_string(), asset: source_asset },
        ConfirmationItem::To { label: target_label.to_string() },
        ConfirmationItem::Amount {
            value: pending.amount,
            exchange: to_user_fiat(rates, &pending.amount)?,
        },
    ];
    if !pending.fee_amount.is_zero() {
        items.push(ConfirmationItem::NetworkFee {
            fee: pending.fee_amount,
            exchange: to_user_fiat(rates, &pending.fee_amount)?,
            asset: source_asset,
            level: pending.fee_selection.selected_level,
        });
    }
    items.push(ConfirmationItem::Total { total, exchange: to_user_fiat(rates, &total)? });
    Ok(items)
}

/// The composite-product breakdown: `[From, To, Total]`, no bare fee line.
pub fn product_confirmations(
    source_label: &str,
    source_asset: Currency,
    target_label: &str,
    pending: &PendingTx,
    rates: &dyn ExchangeRates,
) -> Result<Vec<ConfirmationItem>, TxError> {
    let total = pending.amount.checked_add(&pending.fee_amount)?;
    Ok(vec![
        ConfirmationItem::From { label: source_label.to_string(), asset: source_asset },
        ConfirmationItem::To { label: target_label.to_string() },
        ConfirmationItem::Total { total, exchange: to_user_fiat(rates, &total)? },
    ])
}
