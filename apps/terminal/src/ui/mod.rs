//! Terminal UI.
//!
//! One task owns the terminal: it renders the active view, consumes
//! keyboard events, and drains the update hub receivers. All mode and
//! hold changes funnel through the [`ModeController`] held here, so this
//! task is the single writer of trading state.
//!
//! Views are full-screen surfaces beneath a persistent header. Only the
//! trading view subscribes the terminal to option-chain traffic, and its
//! focus is published over a watch channel so the poll scheduler skips
//! chain fetches while another view is up.

pub mod render;

use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::fanout::{Notice, SharedUpdateHub};
use crate::market::{OptionChainView, Quote};
use crate::mode::{ModeController, OperatingMode};
use crate::store::{TradeRecord, TradeStore};
use crate::telemetry;

/// How long a notice stays on screen.
const NOTICE_TTL_SECS: i64 = 4;

/// Lines of the debug log shown on the debug view.
const LOG_TAIL_LINES: usize = 20;

/// Rows fetched for the database view.
const TRADE_ROWS: u32 = 50;

/// The full-screen surface currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    /// Quote overview and key help.
    #[default]
    Main,
    /// Option chain for the monitored symbol.
    Trading,
    /// Trade store browser.
    Database,
    /// Runtime configuration and log tail.
    Debug,
}

impl ActiveView {
    /// Title shown in the header.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Trading => "TRADING",
            Self::Database => "DATABASE",
            Self::Debug => "DEBUG",
        }
    }
}

/// Everything the UI task needs at startup.
pub struct UiContext {
    /// Update hub the display drains.
    pub hub: SharedUpdateHub,
    /// Mode state machine, driven by key bindings.
    pub controller: ModeController,
    /// Trade store for the database view.
    pub store: Arc<TradeStore>,
    /// Loaded configuration, shown on the debug view.
    pub config: AppConfig,
    /// Publishes whether the trading view is focused.
    pub focus_tx: watch::Sender<bool>,
    /// Cooperative shutdown signal.
    pub shutdown: CancellationToken,
}

/// Render state for the active session.
pub struct App {
    /// Current view.
    pub view: ActiveView,
    /// Current operating mode.
    pub mode: OperatingMode,
    /// Current hold flag.
    pub holding: bool,
    /// Latest quote, retained across failed polls.
    pub quote: Option<Quote>,
    /// Latest option-chain view, retained across failed polls.
    pub chain: Option<OptionChainView>,
    /// Active notice, if any.
    pub notice: Option<Notice>,
    /// Wall-clock shown in the header.
    pub now: DateTime<Utc>,
    /// Table names for the database view.
    pub tables: Vec<String>,
    /// Recent trades for the database view.
    pub trades: Vec<TradeRecord>,
    /// Database files found in the state directory.
    pub db_files: Vec<std::path::PathBuf>,
    /// Index of the selected file in the browser.
    pub db_selected: usize,
    /// File name of the database currently open.
    pub db_file: String,
    /// Log tail for the debug view.
    pub log_tail: Vec<String>,
    /// Configuration snapshot for header and debug view.
    pub config: AppConfig,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            view: ActiveView::Main,
            mode: OperatingMode::Inactive,
            holding: false,
            quote: None,
            chain: None,
            notice: None,
            now: Utc::now(),
            tables: Vec::new(),
            trades: Vec::new(),
            db_files: Vec::new(),
            db_selected: 0,
            db_file: crate::store::DB_FILE_NAME.to_string(),
            log_tail: Vec::new(),
            config,
        }
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    fn tick(&mut self) {
        self.now = Utc::now();
        if self
            .notice
            .as_ref()
            .is_some_and(|n| n.is_expired(ChronoDuration::seconds(NOTICE_TTL_SECS)))
        {
            self.notice = None;
        }
    }
}

/// Run the UI until the operator quits or shutdown is signalled.
///
/// Owns the terminal for its whole lifetime; raw mode and the alternate
/// screen are restored before returning, including on error.
///
/// # Errors
///
/// Returns terminal I/O errors from crossterm or ratatui.
pub async fn run(ctx: UiContext) -> anyhow::Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = run_loop(&mut terminal, ctx).await;

    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("restore cursor")?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut ctx: UiContext,
) -> anyhow::Result<()> {
    let mut app = App::new(ctx.config.clone());

    let mut quotes = ctx.hub.quotes_rx();
    let mut chains = ctx.hub.chains_rx();
    let mut modes = ctx.hub.mode_rx();
    let mut notices = ctx.hub.notices_rx();

    let mut keys = EventStream::new();
    let mut clock = tokio::time::interval(Duration::from_secs(1));

    info!("terminal UI started");

    loop {
        terminal.draw(|frame| render::draw(frame, &app))?;

        tokio::select! {
            Some(event) = keys.next() => {
                match event {
                    Ok(event) => {
                        if handle_event(&event, &mut app, &mut ctx).await? {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "terminal event stream failed");
                        break;
                    }
                }
            }
            Ok(update) = quotes.recv() => {
                app.quote = Some(update.quote);
            }
            Ok(update) = chains.recv() => {
                app.chain = Some(update.chain);
            }
            Ok(update) = modes.recv() => {
                app.mode = update.mode;
                app.holding = update.holding;
            }
            Ok(notice) = notices.recv() => {
                app.show_notice(notice);
            }
            _ = clock.tick() => {
                app.tick();
            }
            () = ctx.shutdown.cancelled() => {
                info!("terminal UI shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Handle one terminal event. Returns `true` to quit.
async fn handle_event(
    event: &Event,
    app: &mut App,
    ctx: &mut UiContext,
) -> anyhow::Result<bool> {
    let Event::Key(key) = event else {
        return Ok(false);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(false);
    }

    if is_quit(key) {
        info!("quit requested");
        return Ok(true);
    }

    match key.code {
        KeyCode::F(5) => {
            let mode = ctx.controller.cycle_mode();
            debug!(%mode, "mode key");
        }
        KeyCode::F(4) => {
            if ctx.controller.toggle_hold().is_err() {
                app.show_notice(Notice::warning("Hold unavailable: mode is INACTIVE"));
            }
        }
        KeyCode::Char('r') => {
            ctx.controller.manual_refresh();
        }
        KeyCode::Char('t') => {
            set_view(app, ctx, ActiveView::Trading).await?;
        }
        KeyCode::Char('d') => {
            set_view(app, ctx, ActiveView::Database).await?;
        }
        KeyCode::Char('g') => {
            set_view(app, ctx, ActiveView::Debug).await?;
        }
        KeyCode::Char('m') | KeyCode::Esc => {
            set_view(app, ctx, ActiveView::Main).await?;
        }
        KeyCode::Up if app.view == ActiveView::Database => {
            app.db_selected = app.db_selected.saturating_sub(1);
        }
        KeyCode::Down if app.view == ActiveView::Database => {
            if app.db_selected + 1 < app.db_files.len() {
                app.db_selected += 1;
            }
        }
        KeyCode::Enter if app.view == ActiveView::Database => {
            open_selected_database(app, ctx).await;
        }
        _ => {}
    }

    Ok(false)
}

fn is_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Switch views and refresh whatever the new view displays.
async fn set_view(app: &mut App, ctx: &mut UiContext, view: ActiveView) -> anyhow::Result<()> {
    if app.view == view {
        return Ok(());
    }
    app.view = view;
    debug!(view = view.title(), "view changed");

    // The scheduler only fetches chains while this is true.
    let _ = ctx.focus_tx.send(view == ActiveView::Trading);

    match view {
        ActiveView::Database => {
            app.db_files = crate::store::list_database_files(&ctx.config.state_dir);
            app.db_selected = app
                .db_files
                .iter()
                .position(|p| file_name_of(p) == app.db_file)
                .unwrap_or(0);
            refresh_database_view(app, ctx).await;
        }
        ActiveView::Debug => {
            app.log_tail = telemetry::tail_log(&ctx.config.state_dir, LOG_TAIL_LINES);
        }
        ActiveView::Main | ActiveView::Trading => {}
    }

    Ok(())
}

/// Reload tables and trades from the open store.
async fn refresh_database_view(app: &mut App, ctx: &UiContext) {
    match ctx.store.table_names().await {
        Ok(tables) => app.tables = tables,
        Err(e) => {
            error!(error = %e, "cannot list tables");
            app.show_notice(Notice::error(format!("Database error: {e}")));
        }
    }
    match ctx.store.recent_trades(TRADE_ROWS).await {
        Ok(trades) => app.trades = trades,
        Err(e) => {
            error!(error = %e, "cannot read trades");
            app.show_notice(Notice::error(format!("Database error: {e}")));
        }
    }
}

/// Open the file selected in the browser and switch the store to it.
///
/// On failure the previously open store stays in place.
async fn open_selected_database(app: &mut App, ctx: &mut UiContext) {
    let Some(path) = app.db_files.get(app.db_selected).cloned() else {
        return;
    };

    match TradeStore::open(&path).await {
        Ok(store) => {
            ctx.store = Arc::new(store);
            app.db_file = file_name_of(&path);
            info!(file = %app.db_file, "database opened");
            app.show_notice(Notice::info(format!("Opened {}", app.db_file)));
            refresh_database_view(app, ctx).await;
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "cannot open database");
            app.show_notice(Notice::error(format!("Database error: {e}")));
        }
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
