//! End-to-end scenarios across the mode controller, poll scheduler, and
//! update hub: arming triggers an immediate poll, stale in-flight results
//! are discarded, empty feeds raise notices without clobbering sinks, and
//! hold is rejected while INACTIVE.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use tokio::sync::{Semaphore, watch};
use tokio_util::sync::CancellationToken;

use spyscalp_terminal::fanout::{NoticeSeverity, SharedUpdateHub, UpdateHub};
use spyscalp_terminal::market::{OptionRecord, Quote, QuoteSource, QuoteSourceError, Symbol};
use spyscalp_terminal::mode::{ModeController, ModeError, OperatingMode};
use spyscalp_terminal::poll::{PollConfig, PollScheduler};

/// What the scripted source answers with.
#[derive(Clone, Copy)]
enum Behavior {
    Quote,
    Empty,
}

/// Deterministic quote source for driving scheduler scenarios.
///
/// When a gate is set, fetches block until a permit is released, which
/// lets a test change modes while a fetch is in flight.
struct ScriptedSource {
    behavior: Behavior,
    gate: Option<Arc<Semaphore>>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            gate: None,
            fetches: AtomicUsize::new(0),
        }
    }

    fn gated(behavior: Behavior, gate: Arc<Semaphore>) -> Self {
        Self {
            behavior,
            gate: Some(gate),
            fetches: AtomicUsize::new(0),
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for ScriptedSource {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, QuoteSourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        match self.behavior {
            Behavior::Quote => Ok(Some(Quote::new(
                symbol.clone(),
                dec!(598.25),
                dec!(0.40),
                1_000,
            ))),
            Behavior::Empty => Ok(None),
        }
    }

    async fn fetch_option_chain(
        &self,
        _symbol: &Symbol,
    ) -> Result<Vec<OptionRecord>, QuoteSourceError> {
        Ok(Vec::new())
    }
}

struct Harness {
    controller: ModeController,
    hub: SharedUpdateHub,
    source: Arc<ScriptedSource>,
    _focus_tx: watch::Sender<bool>,
    shutdown: CancellationToken,
}

fn harness(source: ScriptedSource) -> Harness {
    let source = Arc::new(source);
    let hub = Arc::new(UpdateHub::with_defaults());
    let (focus_tx, focus_rx) = watch::channel(false);
    let shutdown = CancellationToken::new();

    let scheduler = PollScheduler::spawn(
        PollConfig::default(),
        Some(Arc::clone(&source) as Arc<dyn QuoteSource>),
        Arc::clone(&hub),
        focus_rx,
        shutdown.clone(),
    );

    Harness {
        controller: ModeController::new(Arc::clone(&hub), scheduler),
        hub,
        source,
        _focus_tx: focus_tx,
        shutdown,
    }
}

async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn arming_polls_immediately_and_reaches_every_sink() {
    let mut h = harness(ScriptedSource::new(Behavior::Quote));
    let mut sink_a = h.hub.quotes_rx();
    let mut sink_b = h.hub.quotes_rx();
    let mut modes = h.hub.mode_rx();

    assert_eq!(h.controller.mode(), OperatingMode::Inactive);
    assert_eq!(h.controller.cycle_mode(), OperatingMode::Simulation);
    settle().await;

    assert_eq!(h.source.fetch_count(), 1);

    let update = modes.recv().await.unwrap();
    assert_eq!(update.mode, OperatingMode::Simulation);

    let a = sink_a.recv().await.unwrap();
    let b = sink_b.recv().await.unwrap();
    assert_eq!(a.quote.last, dec!(598.25));
    assert_eq!(b.quote.last, dec!(598.25));

    h.shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn in_flight_result_is_discarded_after_mode_leaves_active() {
    let gate = Arc::new(Semaphore::new(0));
    let mut h = harness(ScriptedSource::gated(Behavior::Quote, Arc::clone(&gate)));
    let mut quotes = h.hub.quotes_rx();

    // Arm; the immediate poll blocks inside the source.
    h.controller.cycle_mode();
    settle().await;
    assert_eq!(h.source.fetch_count(), 1);
    assert!(quotes.try_recv().is_err());

    // Two more transitions while the fetch is still in flight.
    assert_eq!(h.controller.cycle_mode(), OperatingMode::Live);
    assert_eq!(h.controller.cycle_mode(), OperatingMode::Inactive);

    // Release the fetch; its result belongs to a superseded schedule.
    gate.add_permits(1);
    settle().await;

    assert!(quotes.try_recv().is_err());

    h.shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn empty_feed_raises_notice_per_tick_without_quote_updates() {
    let mut h = harness(ScriptedSource::new(Behavior::Empty));
    let mut quotes = h.hub.quotes_rx();
    let mut notices = h.hub.notices_rx();

    h.controller.cycle_mode();
    settle().await;

    for _ in 0..2 {
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
    }

    assert_eq!(h.source.fetch_count(), 3);
    assert!(quotes.try_recv().is_err());

    for _ in 0..3 {
        let notice = notices.try_recv().unwrap();
        assert_eq!(notice.severity, NoticeSeverity::Warning);
    }
    assert!(notices.try_recv().is_err());

    h.shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn hold_rejected_while_inactive_and_flag_unchanged() {
    let mut h = harness(ScriptedSource::new(Behavior::Quote));
    let mut modes = h.hub.mode_rx();

    let err = h.controller.toggle_hold().unwrap_err();
    assert_eq!(err, ModeError::HoldWhileInactive);
    assert!(!h.controller.holding());

    // No transition was broadcast and no poll happened.
    settle().await;
    assert!(modes.try_recv().is_err());
    assert_eq!(h.source.fetch_count(), 0);

    h.shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn returning_to_inactive_pauses_polling() {
    let mut h = harness(ScriptedSource::new(Behavior::Quote));

    h.controller.cycle_mode();
    settle().await;
    let armed_fetches = h.source.fetch_count();
    assert!(armed_fetches >= 1);

    h.controller.cycle_mode();
    h.controller.cycle_mode();
    settle().await;

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(h.source.fetch_count(), armed_fetches);

    h.shutdown.cancel();
}
