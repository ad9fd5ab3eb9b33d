use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::errors::TxError;
use crate::core::money::{Currency, Money};

/// The closed set of selectable fee tiers. Validity of each tier is
/// per-engine-family; see `fees::transitions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeeLevel {
    None,
    Regular,
    Priority,
    Custom,
}

/// Sentinel for `FeeSelection::custom_amount` when no custom fee is set.
pub const CUSTOM_AMOUNT_UNSET: i64 = -1;

/// The fee choice attached to a pending transaction: which tier is selected,
/// which tiers this engine/target pair offers, and the computed fee per tier.
///
/// Invariant: `selected_level` is always a member of `available_levels`;
/// `custom_amount` is meaningful only when `selected_level == Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSelection {
    pub selected_level: FeeLevel,
    pub available_levels: BTreeSet<FeeLevel>,
    pub fees_for_levels: BTreeMap<FeeLevel, Money>,
    pub asset: Currency,
    pub custom_amount: i64,
}

impl FeeSelection {
    pub fn new(
        asset: impl Into<Currency>,
        selected_level: FeeLevel,
        available_levels: BTreeSet<FeeLevel>,
    ) -> Result<Self, TxError> {
        if !available_levels.contains(&selected_level) {
            return Err(TxError::FeeLevelUnavailable(selected_level));
        }
        Ok(Self {
            selected_level,
            available_levels,
            fees_for_levels: BTreeMap::new(),
            asset: asset.into(),
            custom_amount: CUSTOM_AMOUNT_UNSET,
        })
    }

    /// Moves the selection to `level`, keeping the invariant.
    pub fn with_level(mut self, level: FeeLevel) -> Result<Self, TxError> {
        if !self.available_levels.contains(&level) {
            return Err(TxError::FeeLevelUnavailable(level));
        }
        self.selected_level = level;
        if level != FeeLevel::Custom {
            self.custom_amount = CUSTOM_AMOUNT_UNSET;
        }
        Ok(self)
    }

    pub fn with_fees(mut self, fees: BTreeMap<FeeLevel, Money>) -> Self {
        self.fees_for_levels = fees;
        self
    }

    pub fn with_custom_amount(mut self, custom_amount: i64) -> Self {
        self.custom_amount = custom_amount;
        self
    }

    /// Computed fee for the currently-selected level, zero when not yet known.
    pub fn selected_fee(&self) -> Money {
        self.fees_for_levels
            .get(&self.selected_level)
            .copied()
            .unwrap_or_else(|| Money::zero(self.asset))
    }
}
