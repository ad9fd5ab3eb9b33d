use serde::{Deserialize, Serialize};

use crate::core::money::Money;

/// Inclusive [min, max] bound on a transferable amount, in the transaction's
/// asset. `max: None` represents an unbounded maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxLimits {
    pub min: Money,
    pub max: Option<Money>,
}

impl TxLimits {
    pub fn new(min: Money, max: Money) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn with_min_and_unlimited_max(min: Money) -> Self {
        Self { min, max: None }
    }

    pub fn is_amount_under_min(&self, amount: &Money) -> bool {
        amount < &self.min
    }

    pub fn is_amount_over_max(&self, amount: &Money) -> bool {
        match &self.max {
            Some(max) => amount > max,
            None => false,
        }
    }
}
