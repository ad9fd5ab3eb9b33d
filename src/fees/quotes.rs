use serde::{Deserialize, Serialize};

use crate::fees::level::FeeLevel;

/// Oracle-reported bounds a custom fee rate must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuoteBounds {
    pub min: u64,
    pub max: u64,
}

impl FeeQuoteBounds {
    pub fn contains(&self, rate: u64) -> bool {
        rate >= self.min && rate <= self.max
    }
}

/// Fee quote for account-model chains: per-unit prices in gwei plus the gas
/// limits for plain and contract targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFeeQuote {
    pub gas_limit: u64,
    pub gas_limit_contract: u64,
    pub regular_gwei: u64,
    pub priority_gwei: u64,
    pub bounds: FeeQuoteBounds,
}

impl AccountFeeQuote {
    pub fn gas_limit_for(&self, is_contract: bool) -> u64 {
        if is_contract {
            self.gas_limit_contract
        } else {
            self.gas_limit
        }
    }

    /// Per-unit price in gwei for a level. `Custom` is priced at the
    /// priority rate on this family; `None` carries no fee.
    pub fn price_gwei(&self, level: FeeLevel) -> u64 {
        match level {
            FeeLevel::None => 0,
            FeeLevel::Regular => self.regular_gwei,
            FeeLevel::Priority | FeeLevel::Custom => self.priority_gwei,
        }
    }
}

/// Fee quote for UTXO chains: sat/byte tiers plus custom-rate bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoFeeQuote {
    pub regular_sat_per_byte: u64,
    pub priority_sat_per_byte: u64,
    pub bounds: FeeQuoteBounds,
}

impl UtxoFeeQuote {
    /// Resolves the sat/byte rate for a level. A custom rate that is unset
    /// or non-positive falls back to the regular tier; validation flags it
    /// separately.
    pub fn sat_per_byte(&self, level: FeeLevel, custom_amount: i64) -> u64 {
        match level {
            FeeLevel::None => 0,
            FeeLevel::Regular => self.regular_sat_per_byte,
            FeeLevel::Priority => self.priority_sat_per_byte,
            FeeLevel::Custom => {
                if custom_amount > 0 {
                    custom_amount as u64
                } else {
                    self.regular_sat_per_byte
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE: AccountFeeQuote = AccountFeeQuote {
        gas_limit: 3000,
        gas_limit_contract: 5000,
        regular_gwei: 2,
        priority_gwei: 5,
        bounds: FeeQuoteBounds { min: 1, max: 100 },
    };

    #[test]
    fn contract_targets_use_the_contract_gas_limit() {
        assert_eq!(QUOTE.gas_limit_for(false), 3000);
        assert_eq!(QUOTE.gas_limit_for(true), 5000);
    }

    #[test]
    fn custom_prices_at_the_priority_rate() {
        assert_eq!(QUOTE.price_gwei(FeeLevel::Custom), 5);
        assert_eq!(QUOTE.price_gwei(FeeLevel::None), 0);
    }

    #[test]
    fn utxo_custom_rate_falls_back_when_unset() {
        let quote = UtxoFeeQuote {
            regular_sat_per_byte: 4,
            priority_sat_per_byte: 9,
            bounds: FeeQuoteBounds { min: 1, max: 50 },
        };
        assert_eq!(quote.sat_per_byte(FeeLevel::Custom, 25), 25);
        assert_eq!(quote.sat_per_byte(FeeLevel::Custom, -1), 4);
        assert_eq!(quote.sat_per_byte(FeeLevel::Priority, -1), 9);
    }
}
