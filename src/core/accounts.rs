use serde::{Deserialize, Serialize};

use crate::core::money::{CryptoCurrency, Currency, Money};

/// The custody model behind a source account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Keys held by the user, funds on chain.
    NonCustodial,
    /// Custodial trading balance.
    Trading,
    /// Custodial yield/interest balance.
    Interest,
}

/// A source account a transaction flow spends from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub label: String,
    pub currency: Currency,
    pub kind: AccountKind,
}

impl Account {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        currency: impl Into<Currency>,
        kind: AccountKind,
    ) -> Self {
        Self { id: id.into(), label: label.into(), currency: currency.into(), kind }
    }
}

/// An on-chain destination address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoAddress {
    pub asset: CryptoCurrency,
    pub address: String,
    /// Contract targets pay a different gas limit on account-model chains.
    pub is_contract: bool,
    pub memo: Option<String>,
}

impl CryptoAddress {
    pub fn new(asset: CryptoCurrency, address: impl Into<String>) -> Self {
        Self { asset, address: address.into(), is_contract: false, memo: None }
    }

    pub fn contract(asset: CryptoCurrency, address: impl Into<String>) -> Self {
        Self { asset, address: address.into(), is_contract: true, memo: None }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Where a transaction sends value. Engines assert identity and currency
/// compatibility with the source account at `start` time; a mismatch is a
/// contract violation, not a user-facing validation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransactionTarget {
    Address(CryptoAddress),
    TradingAccount(Account),
    ProductAccount(Account),
}

impl TransactionTarget {
    pub fn currency(&self) -> Currency {
        match self {
            TransactionTarget::Address(addr) => addr.asset.into(),
            TransactionTarget::TradingAccount(acc) => acc.currency,
            TransactionTarget::ProductAccount(acc) => acc.currency,
        }
    }

    /// Display label used in confirmation line items.
    pub fn label(&self) -> String {
        match self {
            TransactionTarget::Address(addr) => addr.address.clone(),
            TransactionTarget::TradingAccount(acc) => acc.label.clone(),
            TransactionTarget::ProductAccount(acc) => acc.label.clone(),
        }
    }

    pub fn is_contract(&self) -> bool {
        match self {
            TransactionTarget::Address(addr) => addr.is_contract,
            _ => false,
        }
    }

    pub fn memo(&self) -> Option<&str> {
        match self {
            TransactionTarget::Address(addr) => addr.memo.as_deref(),
            _ => None,
        }
    }
}

/// Balance snapshot for an account, asset-denominated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub total: Money,
    pub withdrawable: Money,
    pub pending: Money,
}

impl AccountBalance {
    pub fn zero(currency: impl Into<Currency>) -> Self {
        let currency = currency.into();
        Self {
            total: Money::zero(currency),
            withdrawable: Money::zero(currency),
            pending: Money::zero(currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_currency_follows_the_variant() {
        let addr = TransactionTarget::Address(CryptoAddress::new(CryptoCurrency::Eth, "0xabc"));
        assert_eq!(addr.currency(), Currency::Crypto(CryptoCurrency::Eth));
        assert!(!addr.is_contract());

        let contract =
            TransactionTarget::Address(CryptoAddress::contract(CryptoCurrency::Eth, "0xdef"));
        assert!(contract.is_contract());
    }

    #[test]
    fn memo_only_exists_on_addresses() {
        let addr = TransactionTarget::Address(
            CryptoAddress::new(CryptoCurrency::Xlm, "GA...").with_memo("12345"),
        );
        assert_eq!(addr.memo(), Some("12345"));

        let trading = TransactionTarget::TradingAccount(Account::new(
            "t1",
            "Trading Account",
            CryptoCurrency::Xlm,
            AccountKind::Trading,
        ));
        assert_eq!(trading.memo(), None);
    }
}
