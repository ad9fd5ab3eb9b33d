//! Ordered affordability and limit checks.
//!
//! Validation is first-failure-wins, never cumulative: the stamped state is
//! the first check that fails, evaluated in a fixed order. Contract
//! violations never reach here; only user-correctable conditions become a
//! `ValidationState`.

use tracing::debug;

use crate::core::pending::{PendingTx, ValidationState};
use crate::fees::level::FeeLevel;
use crate::fees::quotes::FeeQuoteBounds;

/// Checks `pending` in order: amount is positive, amount fits the available
/// balance, amount is within `[min, max]` limits, then any fee-level-specific
/// condition supplied by the engine. Returns the first failing state, or
/// `CanExecute`.
pub fn validate(pending: &PendingTx, extra: Option<ValidationState>) -> ValidationState {
    let state = run_checks(pending, extra);
    debug!(?state, amount = %pending.amount, "validated pending transaction");
    state
}

fn run_checks(pending: &PendingTx, extra: Option<ValidationState>) -> ValidationState {
    if !pending.amount.is_positive() {
        return ValidationState::InvalidAmount;
    }
    if pending.amount > pending.available_balance {
        return ValidationState::InsufficientFunds;
    }
    if let Some(limits) = &pending.limits {
        if limits.is_amount_under_min(&pending.amount) {
            return ValidationState::UnderMinLimit;
        }
        if limits.is_amount_over_max(&pending.amount) {
            return ValidationState::OverMaxLimit;
        }
    }
    if let Some(state) = extra {
        return state;
    }
    ValidationState::CanExecute
}

/// Fee-level-specific check for the UTXO family: a selected custom rate must
/// sit inside the oracle-reported bounds. Other levels never trip this.
pub fn check_custom_fee(
    level: FeeLevel,
    custom_amount: i64,
    bounds: &FeeQuoteBounds,
) -> Option<ValidationState> {
    if level != FeeLevel::Custom {
        return None;
    }
    if custom_amount <= 0 {
        return Some(ValidationState::InvalidCustomFee);
    }
    if !bounds.contains(custom_amount as u64) {
        return Some(ValidationState::InvalidCustomFee);
    }
    None
}

/// Memo check for memo-bearing chains: absent memos are fine, present ones
/// must be non-empty and fit the chain's field.
pub fn check_memo(memo: Option<&str>, max_len: usize) -> Option<ValidationState> {
    match memo {
        None => None,
        Some(text) if text.is_empty() || text.len() > max_len => {
            Some(ValidationState::MemoInvalid)
        }
        Some(_) => None,
    }
}
