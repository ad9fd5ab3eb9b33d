use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::errors::TxError;

/// Fiat currencies the engine can denominate limits and exchange values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FiatCurrency {
    Usd,
    Eur,
    Gbp,
}

impl FiatCurrency {
    pub fn ticker(&self) -> &'static str {
        match self {
            FiatCurrency::Usd => "USD",
            FiatCurrency::Eur => "EUR",
            FiatCurrency::Gbp => "GBP",
        }
    }

    pub fn decimals(&self) -> u32 {
        2
    }
}

/// Crypto assets known to the engine family implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CryptoCurrency {
    Btc,
    Eth,
    Xlm,
}

impl CryptoCurrency {
    pub fn ticker(&self) -> &'static str {
        match self {
            CryptoCurrency::Btc => "BTC",
            CryptoCurrency::Eth => "ETH",
            CryptoCurrency::Xlm => "XLM",
        }
    }

    /// Number of minor units in one major unit, as a power of ten.
    pub fn decimals(&self) -> u32 {
        match self {
            CryptoCurrency::Btc => 8,
            CryptoCurrency::Eth => 18,
            CryptoCurrency::Xlm => 7,
        }
    }

    /// Whether transactions to this asset's addresses may carry a memo.
    pub fn supports_memo(&self) -> bool {
        matches!(self, CryptoCurrency::Xlm)
    }
}

/// A currency tag: either a crypto asset or a fiat currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    Crypto(CryptoCurrency),
    Fiat(FiatCurrency),
}

impl Currency {
    pub fn ticker(&self) -> &'static str {
        match self {
            Currency::Crypto(c) => c.ticker(),
            Currency::Fiat(f) => f.ticker(),
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Currency::Crypto(c) => c.decimals(),
            Currency::Fiat(f) => f.decimals(),
        }
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self, Currency::Crypto(_))
    }

    pub fn as_crypto(&self) -> Option<CryptoCurrency> {
        match self {
            Currency::Crypto(c) => Some(*c),
            Currency::Fiat(_) => None,
        }
    }
}

impl From<CryptoCurrency> for Currency {
    fn from(c: CryptoCurrency) -> Self {
        Currency::Crypto(c)
    }
}

impl From<FiatCurrency> for Currency {
    fn from(f: FiatCurrency) -> Self {
        Currency::Fiat(f)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

/// A currency-tagged amount in integer minor units (wei, satoshi, cents).
///
/// Negative amounts are unrepresentable. Mixing currencies in arithmetic or
/// comparison is a programmer error: `Add`/`Sub` panic on mismatch, and
/// ordering between different currencies is undefined (`partial_cmp` returns
/// `None`). Engine code that subtracts fees from balances uses
/// `saturating_sub` so a fee larger than the balance clamps to zero instead
/// of underflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    currency: Currency,
    minor: u128,
}

impl Money {
    pub fn zero(currency: impl Into<Currency>) -> Self {
        Self { currency: currency.into(), minor: 0 }
    }

    pub fn from_minor(currency: impl Into<Currency>, minor: u128) -> Self {
        Self { currency: currency.into(), minor }
    }

    /// Builds a value from a major-unit decimal, truncating below one minor unit.
    pub fn from_major(currency: impl Into<Currency>, major: Decimal) -> Result<Self, TxError> {
        let currency = currency.into();
        if major.is_sign_negative() {
            return Err(TxError::AmountOverflow);
        }
        let scale = Decimal::from_i128_with_scale(10i128.pow(currency.decimals()), 0);
        let minor = major
            .checked_mul(scale)
            .ok_or(TxError::AmountOverflow)?
            .trunc()
            .to_u128()
            .ok_or(TxError::AmountOverflow)?;
        Ok(Self { currency, minor })
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn minor(&self) -> u128 {
        self.minor
    }

    /// The amount expressed in major units as an exact decimal.
    pub fn to_major(&self) -> Result<Decimal, TxError> {
        let minor = i128::try_from(self.minor).map_err(|_| TxError::AmountOverflow)?;
        Decimal::try_from_i128_with_scale(minor, self.currency.decimals())
            .map_err(|_| TxError::AmountOverflow)
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    pub fn is_positive(&self) -> bool {
        self.minor > 0
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, TxError> {
        self.require_same_currency(other)?;
        let minor = self.minor.checked_add(other.minor).ok_or(TxError::AmountOverflow)?;
        Ok(Money { currency: self.currency, minor })
    }

    /// Subtraction that fails when the result would drop below zero.
    pub fn checked_sub(&self, other: &Money) -> Result<Money, TxError> {
        self.require_same_currency(other)?;
        let minor = self.minor.checked_sub(other.minor).ok_or(TxError::AmountOverflow)?;
        Ok(Money { currency: self.currency, minor })
    }

    /// Subtraction clamped at zero, used for balance-minus-fee arithmetic.
    pub fn saturating_sub(&self, other: &Money) -> Money {
        assert_eq!(
            self.currency, other.currency,
            "currency mismatch: cannot subtract {} from {}",
            other.currency, self.currency
        );
        Money { currency: self.currency, minor: self.minor.saturating_sub(other.minor) }
    }

    /// The larger of two same-currency values.
    pub fn max_with(&self, other: &Money) -> Money {
        assert_eq!(
            self.currency, other.currency,
            "currency mismatch: cannot compare {} with {}",
            self.currency, other.currency
        );
        if self.minor >= other.minor {
            *self
        } else {
            *other
        }
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), TxError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(TxError::CurrencyMismatch { expected: self.currency, actual: other.currency })
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        assert_eq!(
            self.currency, rhs.currency,
            "currency mismatch: cannot add {} to {}",
            rhs.currency, self.currency
        );
        Money {
            currency: self.currency,
            minor: self.minor.checked_add(rhs.minor).expect("Money addition overflowed"),
        }
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        assert_eq!(
            self.currency, rhs.currency,
            "currency mismatch: cannot subtract {} from {}",
            rhs.currency, self.currency
        );
        Money {
            currency: self.currency,
            minor: self.minor.checked_sub(rhs.minor).expect("Money subtraction below zero"),
        }
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Money) -> Option<Ordering> {
        if self.currency == other.currency {
            Some(self.minor.cmp(&other.minor))
        } else {
            None
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_major() {
            Ok(major) => write!(f, "{} {}", major, self.currency),
            Err(_) => write!(f, "{} minor {}", self.minor, self.currency),
        }
    }
}

/// A quoted exchange rate from one currency to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
}

impl ExchangeRate {
    pub fn new(from: impl Into<Currency>, to: impl Into<Currency>, rate: Decimal) -> Self {
        Self { from: from.into(), to: to.into(), rate }
    }

    pub fn identity(currency: impl Into<Currency>) -> Self {
        let currency = currency.into();
        Self { from: currency, to: currency, rate: Decimal::ONE }
    }

    /// Converts a value denominated in `from` into `to`.
    pub fn convert(&self, value: &Money) -> Result<Money, TxError> {
        if value.currency() != self.from {
            return Err(TxError::CurrencyMismatch { expected: self.from, actual: value.currency() });
        }
        let major = value.to_major()?;
        let converted = major.checked_mul(self.rate).ok_or(TxError::AmountOverflow)?;
        Money::from_major(self.to, converted)
    }

    /// The rate in the opposite direction. Fails on a zero quote.
    pub fn inverse(&self) -> Result<ExchangeRate, TxError> {
        if self.rate.is_zero() {
            return Err(TxError::RateUnavailable { from: self.to, to: self.from });
        }
        Ok(ExchangeRate {
            from: self.to,
            to: self.from,
            rate: Decimal::ONE.checked_div(self.rate).ok_or(TxError::AmountOverflow)?,
        })
    }
}
