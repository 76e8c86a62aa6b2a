//! Poll Scheduler
//!
//! Periodic market-data polling gated by the operating mode. The scheduler
//! task owns the fetch cycle: one tick fetches the quote for the configured
//! symbol and, when the trading surface is focused, the option chain too,
//! then fans both out through the [`UpdateHub`](crate::fanout::UpdateHub).
//!
//! # States
//!
//! - **Paused** (mode INACTIVE): ticks are skipped, manual refresh is a
//!   no-op.
//! - **Active** (any other mode): fixed-period ticks. Resuming resets the
//!   timer phase and performs one immediate out-of-band poll so the
//!   operator sees fresh data the instant trading is armed.
//!
//! # Stale-result suppression
//!
//! Pausing or resuming bumps a generation counter from the caller's task,
//! so it takes effect even while a fetch is in flight. A tick captures the
//! generation before fetching and re-checks it (plus the armed flag) before
//! broadcasting; results from a superseded schedule are discarded.
//!
//! Fetch failures never stop the ticking: the next natural tick is the
//! retry policy. There is deliberately no backoff or circuit breaker here.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::fanout::{Notice, SharedUpdateHub};
use crate::market::{OptionChainView, QuoteSource, Symbol};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Fixed tick period.
    pub interval: Duration,
    /// The monitored symbol.
    pub symbol: Symbol,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            symbol: Symbol::new("SPY"),
        }
    }
}

/// Control commands delivered to the scheduler task.
#[derive(Debug, Clone, Copy)]
enum Command {
    /// Stop ticking (mode entered INACTIVE).
    Pause,
    /// Start ticking and poll immediately (mode left INACTIVE).
    Resume,
    /// One out-of-cycle poll without touching the timer phase.
    Refresh,
}

/// Handle for driving a running scheduler.
///
/// Pause and resume update the shared armed flag and generation counter
/// synchronously, so an in-flight fetch observes the change the moment it
/// completes even though the scheduler task is still awaiting the source.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    armed: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl SchedulerHandle {
    /// Pause polling. In-flight fetch results are discarded on completion.
    pub fn pause(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.armed.store(false, Ordering::SeqCst);
        let _ = self.cmd_tx.send(Command::Pause);
    }

    /// Resume polling with an immediate out-of-band poll.
    pub fn resume(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.armed.store(true, Ordering::SeqCst);
        let _ = self.cmd_tx.send(Command::Resume);
    }

    /// Request an immediate poll. No-op while paused.
    pub fn refresh(&self) {
        if !self.is_armed() {
            debug!("manual refresh ignored: scheduler is paused");
            return;
        }
        let _ = self.cmd_tx.send(Command::Refresh);
    }

    /// Whether the scheduler is currently armed (not paused).
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// A handle connected to no scheduler task.
    ///
    /// Commands are dropped silently; useful for headless construction and
    /// tests that exercise the mode controller alone.
    #[must_use]
    pub fn detached() -> Self {
        let (cmd_tx, _cmd_rx) = mpsc::unbounded_channel();
        Self {
            cmd_tx,
            armed: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// The polling task and its collaborators.
pub struct PollScheduler {
    config: PollConfig,
    source: Option<Arc<dyn QuoteSource>>,
    hub: SharedUpdateHub,
    trading_focused: watch::Receiver<bool>,
    armed: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

impl PollScheduler {
    /// Spawn the scheduler task, initially paused.
    ///
    /// `source` is `None` when no brokerage credentials were configured;
    /// in that case every tick raises a non-fatal notice and the loop
    /// keeps ticking so a later restart with credentials behaves the same.
    ///
    /// `trading_focused` gates the option-chain fetch: chains are far more
    /// expensive than single quotes, so they are fetched only while the
    /// trading surface is the visible one.
    #[must_use]
    pub fn spawn(
        config: PollConfig,
        source: Option<Arc<dyn QuoteSource>>,
        hub: SharedUpdateHub,
        trading_focused: watch::Receiver<bool>,
        shutdown: CancellationToken,
    ) -> SchedulerHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let armed = Arc::new(AtomicBool::new(false));
        let generation = Arc::new(AtomicU64::new(0));

        let handle = SchedulerHandle {
            cmd_tx,
            armed: Arc::clone(&armed),
            generation: Arc::clone(&generation),
        };

        let scheduler = Self {
            config,
            source,
            hub,
            trading_focused,
            armed,
            generation,
        };

        tokio::spawn(scheduler.run(cmd_rx, shutdown));

        handle
    }

    async fn run(self, mut cmd_rx: mpsc::UnboundedReceiver<Command>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            period_secs = self.config.interval.as_secs(),
            symbol = %self.config.symbol,
            "poll scheduler started (paused)"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.armed.load(Ordering::SeqCst) {
                        self.poll_once().await;
                    }
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Pause) => {
                        info!("market data polling paused");
                    }
                    Some(Command::Resume) => {
                        // Ticks are periodic relative to the schedule change;
                        // the immediate poll is out-of-band.
                        interval.reset();
                        info!("market data polling resumed");
                        self.poll_once().await;
                    }
                    Some(Command::Refresh) => {
                        debug!("manual refresh");
                        self.poll_once().await;
                    }
                    None => break,
                },
                () = shutdown.cancelled() => {
                    info!("poll scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// One fetch-and-distribute cycle.
    async fn poll_once(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        if !self.armed.load(Ordering::SeqCst) {
            return;
        }

        let Some(source) = &self.source else {
            warn!("market data source not configured");
            let _ = self
                .hub
                .send_notice(Notice::error("Market data error: source not configured"));
            return;
        };

        let quote_result = source.fetch_quote(&self.config.symbol).await;

        // Chain fetch only when the quote arrived and the trading surface
        // is visible; keeps both snapshots on the same tick.
        let chain_result = match &quote_result {
            Ok(Some(_)) if *self.trading_focused.borrow() => {
                Some(source.fetch_option_chain(&self.config.symbol).await)
            }
            _ => None,
        };

        // Mandatory post-fetch state re-check before any rendering.
        if self.generation.load(Ordering::SeqCst) != generation
            || !self.armed.load(Ordering::SeqCst)
        {
            debug!("discarding poll results from a superseded schedule");
            return;
        }

        match quote_result {
            Ok(Some(quote)) => {
                debug!(symbol = %quote.symbol, last = %quote.last, "quote received");
                let _ = self.hub.send_quote(quote);
            }
            Ok(None) => {
                warn!(symbol = %self.config.symbol, "no quote received");
                let _ = self
                    .hub
                    .send_notice(Notice::warning("Market data: no quote received"));
            }
            Err(e) => {
                error!(error = %e, "quote fetch failed");
                let _ = self
                    .hub
                    .send_notice(Notice::error(format!("Connection error: {e}")));
            }
        }

        match chain_result {
            Some(Ok(records)) if records.is_empty() => {
                debug!(symbol = %self.config.symbol, "option chain empty, keeping last view");
            }
            Some(Ok(records)) => {
                let _ = self.hub.send_chain(OptionChainView::from_records(&records));
            }
            Some(Err(e)) => {
                error!(error = %e, "option chain fetch failed");
                let _ = self
                    .hub
                    .send_notice(Notice::error(format!("Option chain error: {e}")));
            }
            None => {}
        }
    }
}
