//! Tastytrade REST market-data adapter.
//!
//! Implements [`QuoteSource`] against the brokerage's JSON API. The session
//! token is assumed to be minted and refreshed by an external credential
//! collaborator; this adapter only attaches it to requests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::{OptionRecord, OptionType, Quote, QuoteSource, QuoteSourceError, Symbol};

/// Default production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.tastyworks.com";

/// Configuration for the Tastytrade adapter.
#[derive(Debug, Clone)]
pub struct TastytradeConfig {
    /// API base URL.
    pub base_url: String,
    /// Session token attached to every request.
    pub session_token: String,
}

impl TastytradeConfig {
    /// Create a config against the production API.
    #[must_use]
    pub fn new(session_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_token: session_token.into(),
        }
    }

    /// Override the base URL (tests, certification environment).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Quote source backed by the Tastytrade market-data REST API.
pub struct TastytradeQuoteSource {
    client: reqwest::Client,
    config: TastytradeConfig,
}

impl TastytradeQuoteSource {
    /// Create a new adapter.
    #[must_use]
    pub fn new(config: TastytradeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, QuoteSourceError> {
        let url = format!("{}{path}", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.config.session_token)
            .send()
            .await
            .map_err(|e| QuoteSourceError::Transport {
                message: e.to_string(),
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(QuoteSourceError::Unauthorized),
            status if !status.is_success() => {
                return Err(QuoteSourceError::Transport {
                    message: format!("unexpected status {status} from {path}"),
                });
            }
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| QuoteSourceError::Decode {
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl QuoteSource for TastytradeQuoteSource {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, QuoteSourceError> {
        let path = format!("/market-data/quotes?symbols={symbol}");
        let envelope: Envelope<QuoteItems> = self.get_json(&path).await?;

        let Some(item) = envelope.data.items.into_iter().next() else {
            debug!(%symbol, "quote feed returned no items");
            return Ok(None);
        };

        Ok(Some(Quote {
            symbol: Symbol::new(item.symbol),
            last: item.last,
            change: item.net_change,
            volume: item.volume,
            timestamp: item.updated_at.unwrap_or_else(Utc::now),
        }))
    }

    async fn fetch_option_chain(
        &self,
        symbol: &Symbol,
    ) -> Result<Vec<OptionRecord>, QuoteSourceError> {
        let path = format!("/option-chains/{symbol}/compact");
        let envelope: Envelope<ChainItems> = self.get_json(&path).await?;

        Ok(envelope
            .data
            .items
            .into_iter()
            .map(|item| OptionRecord {
                strike: item.strike_price,
                option_type: item.option_type.into(),
                bid: item.bid,
                ask: item.ask,
                expiry: item.expiration_date,
            })
            .collect())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct QuoteItems {
    #[serde(default = "Vec::new")]
    items: Vec<QuoteItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct QuoteItem {
    symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    last: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    net_change: Decimal,
    #[serde(default)]
    volume: u64,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ChainItems {
    #[serde(default = "Vec::new")]
    items: Vec<ChainItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ChainItem {
    #[serde(with = "rust_decimal::serde::str")]
    strike_price: Decimal,
    option_type: WireOptionType,
    #[serde(with = "rust_decimal::serde::str")]
    bid: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    ask: Decimal,
    expiration_date: NaiveDate,
}

/// The feed encodes option type as a single letter.
#[derive(Debug, Clone, Copy, Deserialize)]
enum WireOptionType {
    #[serde(rename = "C")]
    Call,
    #[serde(rename = "P")]
    Put,
}

impl From<WireOptionType> for OptionType {
    fn from(value: WireOptionType) -> Self {
        match value {
            WireOptionType::Call => Self::Call,
            WireOptionType::Put => Self::Put,
        }
    }
}
