//! Market Data
//!
//! Quote and option-chain snapshot types, the `QuoteSource` contract, and
//! the Tastytrade REST adapter that implements it.

mod chain;
mod quote;
mod source;
mod symbol;
pub mod tastytrade;

pub use chain::{ChainRow, OptionChainView, OptionRecord, OptionType};
pub use quote::Quote;
pub use source::{QuoteSource, QuoteSourceError};
pub use symbol::Symbol;

#[cfg(test)]
pub use source::MockQuoteSource;
