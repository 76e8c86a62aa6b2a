//! Spyscalp Terminal Binary
//!
//! Starts the terminal dashboard.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p spyscalp-terminal
//! ```
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SPYSCALP_STATE_DIR`: State directory (default: `~/.spyscalp`)
//! - `SPYSCALP_SYMBOL`: Monitored symbol (default: SPY)
//! - `SPYSCALP_POLL_INTERVAL_SECS`: Poll period in seconds (default: 5)
//! - `TT_SESSION_TOKEN`: Pre-minted brokerage session token
//! - `RUST_LOG`: Log filter (default: `info,spyscalp_terminal=debug`)
//!
//! Brokerage credentials live in `SPYSCALP.conf` inside the state
//! directory; a template is written on first run.

use std::sync::Arc;
use std::time::Duration;

use spyscalp_terminal::config::AppConfig;
use spyscalp_terminal::fanout::UpdateHub;
use spyscalp_terminal::market::QuoteSource;
use spyscalp_terminal::market::tastytrade::{TastytradeConfig, TastytradeQuoteSource};
use spyscalp_terminal::mode::ModeController;
use spyscalp_terminal::poll::{PollConfig, PollScheduler};
use spyscalp_terminal::store::TradeStore;
use spyscalp_terminal::{startup, telemetry, ui};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How long the splash screen waits for a key press.
const SPLASH_WAIT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load_default()?;
    telemetry::init(&config.state_dir)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        state_dir = %config.state_dir.display(),
        symbol = %config.symbol,
        "spyscalp terminal starting"
    );

    let reports = startup::run_checks(&config).await;
    startup::print_report(&reports);
    startup::wait_for_key(SPLASH_WAIT);

    let store = Arc::new(TradeStore::open_default(&config.state_dir).await?);

    let source: Option<Arc<dyn QuoteSource>> = config.session_token.as_ref().map(|token| {
        Arc::new(TastytradeQuoteSource::new(TastytradeConfig::new(token.clone())))
            as Arc<dyn QuoteSource>
    });
    if source.is_none() {
        info!("no session token; market data polling will raise notices");
    }

    let hub = Arc::new(UpdateHub::with_defaults());
    let (focus_tx, focus_rx) = watch::channel(false);
    let shutdown = CancellationToken::new();

    let scheduler = PollScheduler::spawn(
        PollConfig {
            interval: config.poll_interval,
            symbol: config.symbol.clone(),
        },
        source,
        Arc::clone(&hub),
        focus_rx,
        shutdown.clone(),
    );

    let controller = ModeController::new(Arc::clone(&hub), scheduler);

    let result = ui::run(ui::UiContext {
        hub,
        controller,
        store,
        config,
        focus_tx,
        shutdown: shutdown.clone(),
    })
    .await;

    shutdown.cancel();
    info!("spyscalp terminal stopped");

    result
}
