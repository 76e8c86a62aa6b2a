//! Quote Source contract.
//!
//! The poll scheduler depends on this abstraction rather than a concrete
//! brokerage client. Both operations are single-shot: no retries live in
//! the source, retry policy is the scheduler's natural next-tick cadence.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::{OptionRecord, Quote, Symbol};

/// Errors surfaced by a quote source.
///
/// The scheduler treats every variant like an empty result for display
/// purposes (previous values are retained) but logs them distinctly.
#[derive(Debug, Clone, Error)]
pub enum QuoteSourceError {
    /// Transport-level failure (connection refused, timeout, 5xx).
    #[error("transport error: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// The payload arrived but could not be decoded.
    #[error("malformed market data payload: {message}")]
    Decode {
        /// Error details.
        message: String,
    },

    /// The brokerage rejected the session token.
    #[error("brokerage session is not authorized")]
    Unauthorized,
}

/// Port for fetching point-in-time market data.
///
/// `fetch_quote` returning `Ok(None)` and `fetch_option_chain` returning an
/// empty list both mean "no data right now" (for example, market closed)
/// and are distinct from errors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the latest quote for a symbol.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, QuoteSourceError>;

    /// Fetch the full option chain for a symbol.
    async fn fetch_option_chain(
        &self,
        symbol: &Symbol,
    ) -> Result<Vec<OptionRecord>, QuoteSourceError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[tokio::test]
    async fn mock_source_returns_scripted_quote() {
        let mut source = MockQuoteSource::new();
        source.expect_fetch_quote().returning(|symbol| {
            Ok(Some(Quote::new(
                symbol.clone(),
                dec!(598.25),
                dec!(0.40),
                1_000,
            )))
        });

        let quote = source.fetch_quote(&Symbol::new("SPY")).await.unwrap();
        assert_eq!(quote.unwrap().last, dec!(598.25));
    }

    #[test]
    fn error_display_includes_detail() {
        let err = QuoteSourceError::Transport {
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }
}
