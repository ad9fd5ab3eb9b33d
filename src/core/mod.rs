pub mod accounts;
pub mod errors;
pub mod limits;
pub mod money;
pub mod pending;

pub use accounts::{Account, AccountBalance, AccountKind, CryptoAddress, TransactionTarget};
pub use errors::TxError;
pub use limits::TxLimits;
pub use money::{CryptoCurrency, Currency, ExchangeRate, FiatCurrency, Money};
pub use pending::{PendingTx, TxResult, ValidationState};
