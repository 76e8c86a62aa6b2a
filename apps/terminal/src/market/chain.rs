//! Option chain types.
//!
//! A poll tick produces a full replacement list of [`OptionRecord`]s; the
//! display-oriented [`OptionChainView`] groups them by strike into rows of
//! (call bid, call ask, strike, put bid, put ask), strike ascending.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option contract type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionType {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl OptionType {
    /// Display label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "CALL",
            Self::Put => "PUT",
        }
    }
}

/// A single option quote record from the chain feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Strike price.
    pub strike: Decimal,
    /// Call or put.
    #[serde(rename = "type")]
    pub option_type: OptionType,
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Expiry date.
    pub expiry: NaiveDate,
}

/// One display row of the chain: both sides of a strike.
///
/// A side is `None` when the feed carried no record for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainRow {
    /// Call bid, if a call exists at this strike.
    pub call_bid: Option<Decimal>,
    /// Call ask, if a call exists at this strike.
    pub call_ask: Option<Decimal>,
    /// Strike price.
    pub strike: Decimal,
    /// Put bid, if a put exists at this strike.
    pub put_bid: Option<Decimal>,
    /// Put ask, if a put exists at this strike.
    pub put_ask: Option<Decimal>,
}

/// Derived view of an option chain, recomputed per tick.
///
/// Rows are grouped by strike and sorted strike ascending. When the same
/// side appears twice for a strike the later record wins (full replacement
/// semantics).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionChainView {
    rows: Vec<ChainRow>,
}

impl OptionChainView {
    /// Build the view from a full replacement list of records.
    #[must_use]
    pub fn from_records(records: &[OptionRecord]) -> Self {
        let mut by_strike: BTreeMap<Decimal, ChainRow> = BTreeMap::new();

        for record in records {
            let row = by_strike
                .entry(record.strike)
                .or_insert_with(|| ChainRow {
                    strike: record.strike,
                    ..ChainRow::default()
                });
            match record.option_type {
                OptionType::Call => {
                    row.call_bid = Some(record.bid);
                    row.call_ask = Some(record.ask);
                }
                OptionType::Put => {
                    row.put_bid = Some(record.bid);
                    row.put_ask = Some(record.ask);
                }
            }
        }

        Self {
            rows: by_strike.into_values().collect(),
        }
    }

    /// Rows in strike-ascending order.
    #[must_use]
    pub fn rows(&self) -> &[ChainRow] {
        &self.rows
    }

    /// Whether the view holds no strikes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of strike rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
