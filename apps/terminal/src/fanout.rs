//! Update fan-out hub.
//!
//! Distributes market data, mode transitions, and operator notices to
//! display surfaces over tokio broadcast channels. Sinks register by
//! subscribing for a receiver and deregister by dropping it; nothing in the
//! core enumerates concrete screens.
//!
//! Option-chain updates travel on their own channel so that only the sink
//! representing the trading view subscribes to them; other surfaces never
//! see chain traffic.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;

use crate::market::{OptionChainView, Quote};
use crate::mode::OperatingMode;

// =============================================================================
// Broadcast messages
// =============================================================================

/// A quote snapshot pushed to every quote-displaying sink.
#[derive(Debug, Clone)]
pub struct QuoteUpdate {
    /// The quote data.
    pub quote: Quote,
}

/// A full option-chain view for the trading surface.
#[derive(Debug, Clone)]
pub struct ChainUpdate {
    /// The derived chain view.
    pub chain: OptionChainView,
}

/// A mode or hold transition.
#[derive(Debug, Clone, Copy)]
pub struct ModeUpdate {
    /// Current operating mode.
    pub mode: OperatingMode,
    /// Current hold flag.
    pub holding: bool,
}

/// Severity tier for operator notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    /// Informational.
    Info,
    /// Degraded but expected condition (empty feed, hold rejected).
    Warning,
    /// Failure condition (transport error, missing source).
    Error,
}

/// A user-visible, non-fatal notification.
///
/// Notices carry their creation time; sinks decide when to stop showing
/// one via [`Notice::is_expired`] instead of the core owning hide timers.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Severity tier.
    pub severity: NoticeSeverity,
    /// Human-readable message.
    pub message: String,
    /// Creation time, checked by sinks for expiry.
    pub at: DateTime<Utc>,
}

impl Notice {
    /// Create a notice stamped now.
    #[must_use]
    pub fn new(severity: NoticeSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Informational notice.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeSeverity::Info, message)
    }

    /// Warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeSeverity::Warning, message)
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeSeverity::Error, message)
    }

    /// Whether the notice has outlived its display window.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.at >= ttl
    }
}

// =============================================================================
// Update hub
// =============================================================================

/// Channel capacities for the hub.
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Capacity of the quote channel.
    pub quotes_capacity: usize,
    /// Capacity of the option-chain channel.
    pub chains_capacity: usize,
    /// Capacity of the mode-update channel.
    pub mode_capacity: usize,
    /// Capacity of the notice channel.
    pub notices_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            quotes_capacity: 64,
            chains_capacity: 16,
            mode_capacity: 16,
            notices_capacity: 64,
        }
    }
}

/// Central hub for all display-bound updates.
#[derive(Debug)]
pub struct UpdateHub {
    quotes_tx: broadcast::Sender<QuoteUpdate>,
    chains_tx: broadcast::Sender<ChainUpdate>,
    mode_tx: broadcast::Sender<ModeUpdate>,
    notices_tx: broadcast::Sender<Notice>,
}

impl UpdateHub {
    /// Create a new hub with the given configuration.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self {
            quotes_tx: broadcast::channel(config.quotes_capacity).0,
            chains_tx: broadcast::channel(config.chains_capacity).0,
            mode_tx: broadcast::channel(config.mode_capacity).0,
            notices_tx: broadcast::channel(config.notices_capacity).0,
        }
    }

    /// Create a hub with default capacities.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(HubConfig::default())
    }

    /// Send a quote to all subscribed sinks.
    ///
    /// Returns the number of receivers, or `None` if no sink is attached.
    pub fn send_quote(&self, quote: Quote) -> Option<usize> {
        self.quotes_tx.send(QuoteUpdate { quote }).ok()
    }

    /// Get a new receiver for quotes.
    #[must_use]
    pub fn quotes_rx(&self) -> broadcast::Receiver<QuoteUpdate> {
        self.quotes_tx.subscribe()
    }

    /// Send an option-chain view to the trading surface.
    pub fn send_chain(&self, chain: OptionChainView) -> Option<usize> {
        self.chains_tx.send(ChainUpdate { chain }).ok()
    }

    /// Get a new receiver for option-chain views.
    ///
    /// Only the sink representing the trading view should subscribe here.
    #[must_use]
    pub fn chains_rx(&self) -> broadcast::Receiver<ChainUpdate> {
        self.chains_tx.subscribe()
    }

    /// Send a mode/hold transition to all subscribed sinks.
    pub fn send_mode(&self, mode: OperatingMode, holding: bool) -> Option<usize> {
        self.mode_tx.send(ModeUpdate { mode, holding }).ok()
    }

    /// Get a new receiver for mode updates.
    #[must_use]
    pub fn mode_rx(&self) -> broadcast::Receiver<ModeUpdate> {
        self.mode_tx.subscribe()
    }

    /// Send an operator notice.
    pub fn send_notice(&self, notice: Notice) -> Option<usize> {
        self.notices_tx.send(notice).ok()
    }

    /// Get a new receiver for notices.
    #[must_use]
    pub fn notices_rx(&self) -> broadcast::Receiver<Notice> {
        self.notices_tx.subscribe()
    }

    /// Number of sinks subscribed to quotes.
    #[must_use]
    pub fn quote_receiver_count(&self) -> usize {
        self.quotes_tx.receiver_count()
    }

    /// Number of sinks subscribed to option chains.
    #[must_use]
    pub fn chain_receiver_count(&self) -> usize {
        self.chains_tx.receiver_count()
    }
}

impl Default for UpdateHub {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shared hub reference.
pub type SharedUpdateHub = Arc<UpdateHub>;
