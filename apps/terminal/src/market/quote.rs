//! Quote snapshot type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Symbol;

/// A point-in-time quote for an equity.
///
/// Produced fresh on every poll tick and superseded wholesale by the next
/// tick. A quote has no persistent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Last traded price.
    pub last: Decimal,
    /// Change since previous close (may be negative).
    pub change: Decimal,
    /// Cumulative session volume.
    pub volume: u64,
    /// Quote timestamp.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote stamped with the current time.
    #[must_use]
    pub fn new(symbol: Symbol, last: Decimal, change: Decimal, volume: u64) -> Self {
        Self {
            symbol,
            last,
            change,
            volume,
            timestamp: Utc::now(),
        }
    }

    /// Whether the session change is negative.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.change < Decimal::ZERO
    }
}
