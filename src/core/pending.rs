use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::limits::TxLimits;
use crate::core::money::{Currency, FiatCurrency, Money};
use crate::engine::confirmations::{ConfirmationItem, ConfirmationKind};
use crate::fees::level::FeeSelection;

/// Outcome of validating a pending transaction. `CanExecute` is the only
/// state from which `execute` may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationState {
    Uninitialised,
    CanExecute,
    InvalidAmount,
    InsufficientFunds,
    UnderMinLimit,
    OverMaxLimit,
    InvalidCustomFee,
    MemoInvalid,
}

/// Result of a successful execution hand-off. Custodial venues batch
/// transfers and return no hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TxResult {
    Hashed { tx_id: String, amount: Money },
    UnHashed { amount: Money },
}

impl TxResult {
    pub fn amount(&self) -> &Money {
        match self {
            TxResult::Hashed { amount, .. } => amount,
            TxResult::UnHashed { amount } => amount,
        }
    }
}

/// The immutable snapshot of an in-progress transaction.
///
/// A fresh record is created per engine `start`; every update replaces the
/// whole value via the `with_*` methods, never mutating in place. One
/// logical current `PendingTx` exists per flow (single-writer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTx {
    pub amount: Money,
    pub total_balance: Money,
    pub available_balance: Money,
    pub fee_for_full_available: Money,
    pub fee_amount: Money,
    pub fee_selection: FeeSelection,
    pub selected_fiat: FiatCurrency,
    pub limits: Option<TxLimits>,
    pub confirmations: Vec<ConfirmationItem>,
    pub validation_state: ValidationState,
    /// Engine-private scratch values threaded between operations.
    pub engine_state: HashMap<String, Value>,
}

impl PendingTx {
    /// A zero-valued record for `asset` with the given fee selection.
    pub fn new(
        asset: impl Into<Currency>,
        selected_fiat: FiatCurrency,
        fee_selection: FeeSelection,
    ) -> Self {
        let asset = asset.into();
        Self {
            amount: Money::zero(asset),
            total_balance: Money::zero(asset),
            available_balance: Money::zero(asset),
            fee_for_full_available: Money::zero(asset),
            fee_amount: Money::zero(asset),
            fee_selection,
            selected_fiat,
            limits: None,
            confirmations: Vec::new(),
            validation_state: ValidationState::Uninitialised,
            engine_state: HashMap::new(),
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_balances(mut self, total: Money, available: Money) -> Self {
        self.total_balance = total;
        self.available_balance = available;
        self
    }

    pub fn with_fee(mut self, fee_amount: Money, fee_for_full_available: Money) -> Self {
        self.fee_amount = fee_amount;
        self.fee_for_full_available = fee_for_full_available;
        self
    }

    pub fn with_fee_selection(mut self, fee_selection: FeeSelection) -> Self {
        self.fee_selection = fee_selection;
        self
    }

    pub fn with_limits(mut self, limits: TxLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_confirmations(mut self, confirmations: Vec<ConfirmationItem>) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn with_validation_state(mut self, state: ValidationState) -> Self {
        self.validation_state = state;
        self
    }

    pub fn with_engine_state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.engine_state.insert(key.into(), value);
        self
    }

    pub fn engine_state(&self, key: &str) -> Option<&Value> {
        self.engine_state.get(key)
    }

    pub fn has_confirmation(&self, kind: ConfirmationKind) -> bool {
        self.confirmations.iter().any(|c| c.kind() == kind)
    }

    /// Position of a confirmation kind in the ordered list.
    pub fn confirmation_index(&self, kind: ConfirmationKind) -> Option<usize> {
        self.confirmations.iter().position(|c| c.kind() == kind)
    }
}
