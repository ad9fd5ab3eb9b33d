pub mod level;
pub mod quotes;
pub mod transitions;

pub use level::{FeeLevel, FeeSelection, CUSTOM_AMOUNT_UNSET};
pub use quotes::{AccountFeeQuote, FeeQuoteBounds, UtxoFeeQuote};
pub use transitions::{table_for, EngineFamily, TransitionTable};
