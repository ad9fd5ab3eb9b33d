//! Per-engine-family fee-level transition whitelists.
//!
//! Legality is explicit static data, never inferred from enum ordinals:
//! different asset families have different legal sets, and whether `None`
//! is legal at all is per-family configuration.

use serde::{Deserialize, Serialize};

use crate::core::errors::TxError;
use crate::fees::level::FeeLevel;

/// The engine families the transition tables are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineFamily {
    /// Account-model on-chain (gas limit x gas price).
    AccountModel,
    /// UTXO-model on-chain (sat/byte coin selection).
    Utxo,
    /// Custodial trading balance; the venue absorbs fee choice.
    Trading,
    /// Composite yield/staking products; no fee choice exposed to the user.
    Product,
}

/// A whitelist of allowed `(from, to)` fee-level transitions.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable {
    pub family: EngineFamily,
    allowed: &'static [(FeeLevel, FeeLevel)],
}

impl TransitionTable {
    pub fn permits(&self, from: FeeLevel, to: FeeLevel) -> bool {
        self.allowed.contains(&(from, to))
    }

    /// `Ok` when legal; the contract-violation error otherwise.
    pub fn check(&self, from: FeeLevel, to: FeeLevel) -> Result<(), TxError> {
        if self.permits(from, to) {
            Ok(())
        } else {
            Err(TxError::IllegalFeeLevelTransition { from, to })
        }
    }
}

pub const ACCOUNT_MODEL_TRANSITIONS: TransitionTable = TransitionTable {
    family: EngineFamily::AccountModel,
    allowed: &[
        (FeeLevel::Regular, FeeLevel::Regular),
        (FeeLevel::Regular, FeeLevel::Priority),
        (FeeLevel::Priority, FeeLevel::Regular),
        (FeeLevel::Priority, FeeLevel::Priority),
    ],
};

pub const UTXO_TRANSITIONS: TransitionTable = TransitionTable {
    family: EngineFamily::Utxo,
    allowed: &[
        (FeeLevel::Regular, FeeLevel::Regular),
        (FeeLevel::Regular, FeeLevel::Priority),
        (FeeLevel::Regular, FeeLevel::Custom),
        (FeeLevel::Priority, FeeLevel::Regular),
        (FeeLevel::Priority, FeeLevel::Priority),
        (FeeLevel::Priority, FeeLevel::Custom),
        (FeeLevel::Custom, FeeLevel::Regular),
        (FeeLevel::Custom, FeeLevel::Priority),
        (FeeLevel::Custom, FeeLevel::Custom),
    ],
};

pub const TRADING_TRANSITIONS: TransitionTable = TransitionTable {
    family: EngineFamily::Trading,
    allowed: &[(FeeLevel::None, FeeLevel::None)],
};

// Same-level no-ops only: yield products do not expose fee choice, even
// where the inner engine would accept a transition.
pub const PRODUCT_TRANSITIONS: TransitionTable = TransitionTable {
    family: EngineFamily::Product,
    allowed: &[
        (FeeLevel::None, FeeLevel::None),
        (FeeLevel::Regular, FeeLevel::Regular),
        (FeeLevel::Priority, FeeLevel::Priority),
        (FeeLevel::Custom, FeeLevel::Custom),
    ],
};

pub fn table_for(family: EngineFamily) -> &'static TransitionTable {
    match family {
        EngineFamily::AccountModel => &ACCOUNT_MODEL_TRANSITIONS,
        EngineFamily::Utxo => &UTXO_TRANSITIONS,
        EngineFamily::Trading => &TRADING_TRANSITIONS,
        EngineFamily::Product => &PRODUCT_TRANSITIONS,
    }
}
