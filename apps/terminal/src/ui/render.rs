//! View rendering.
//!
//! Pure functions from [`App`] state to widgets; no state mutation here.
//! The persistent header carries the mode banner, clock, and latest quote
//! so every view shows trading posture at a glance.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table};

use crate::fanout::NoticeSeverity;
use crate::market::Quote;
use crate::mode::OperatingMode;

use super::{ActiveView, App};

/// Draw the whole frame for the current view.
pub fn draw(frame: &mut Frame, app: &App) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(5),
        Constraint::Length(3),
    ])
    .areas(frame.area());

    draw_header(frame, header, app);

    match app.view {
        ActiveView::Main => draw_main(frame, body, app),
        ActiveView::Trading => draw_trading(frame, body, app),
        ActiveView::Database => draw_database(frame, body, app),
        ActiveView::Debug => draw_debug(frame, body, app),
    }

    draw_footer(frame, footer, app);
}

/// Banner style for a mode and hold combination.
///
/// INACTIVE is deliberately colorless; every armed state gets a loud
/// background so live trading is unmistakable in peripheral vision.
#[must_use]
pub fn mode_style(mode: OperatingMode, holding: bool) -> Style {
    match (mode, holding) {
        (OperatingMode::Inactive, _) => Style::default().fg(Color::White),
        (OperatingMode::Simulation, false) => Style::default().fg(Color::White).bg(Color::Blue),
        (OperatingMode::Simulation, true) => Style::default().fg(Color::Black).bg(Color::Cyan),
        (OperatingMode::Live, false) => Style::default().fg(Color::White).bg(Color::Magenta),
        (OperatingMode::Live, true) => Style::default().fg(Color::Black).bg(Color::Yellow),
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mode_span = Span::styled(
        format!(" {} ", app.mode.display_label(app.holding)),
        mode_style(app.mode, app.holding).add_modifier(Modifier::BOLD),
    );

    let broker_span = if app.config.has_broker_access() {
        Span::styled("TT LINKED", Style::default().fg(Color::Green))
    } else {
        Span::styled("TT OFFLINE", Style::default().fg(Color::DarkGray))
    };

    let mut spans = vec![
        mode_span,
        Span::raw("  "),
        Span::raw(app.now.format("%H:%M:%S UTC").to_string()),
        Span::raw("  "),
        broker_span,
        Span::raw("  "),
        Span::styled(
            format!("FILE: {}", app.db_file),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            app.config.symbol.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];
    spans.extend(quote_spans(app.quote.as_ref()));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" SPYSCALP | {} ", app.view.title()));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Quote summary spans, colored by direction of change.
fn quote_spans(quote: Option<&Quote>) -> Vec<Span<'static>> {
    let Some(quote) = quote else {
        return vec![Span::styled(
            "awaiting data",
            Style::default().fg(Color::DarkGray),
        )];
    };

    let change_style = if quote.is_down() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    vec![
        Span::raw(format!("{:.2}", quote.last)),
        Span::raw(" "),
        Span::styled(format!("{:+.2}", quote.change), change_style),
        Span::raw(format!("  vol {}", quote.volume)),
    ]
}

fn draw_main(frame: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::raw("")];

    match &app.quote {
        Some(quote) => {
            lines.push(Line::from(vec![
                Span::raw("  Last     "),
                Span::styled(
                    format!("{:.2}", quote.last),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            let change_color = if quote.is_down() {
                Color::Red
            } else {
                Color::Green
            };
            lines.push(Line::from(vec![
                Span::raw("  Change   "),
                Span::styled(
                    format!("{:+.2}", quote.change),
                    Style::default().fg(change_color),
                ),
            ]));
            lines.push(Line::raw(format!("  Volume   {}", quote.volume)));
            lines.push(Line::raw(format!(
                "  Updated  {}",
                quote.timestamp.format("%H:%M:%S UTC")
            )));
        }
        None => lines.push(Line::styled(
            "  No market data yet. Press F5 to arm polling.",
            Style::default().fg(Color::DarkGray),
        )),
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "  t trading   d database   g debug",
        Style::default().fg(Color::DarkGray),
    ));

    let block = Block::default().borders(Borders::ALL).title(" Overview ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_trading(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Option Chain | {} ", app.config.symbol));

    let Some(chain) = app.chain.as_ref().filter(|c| !c.is_empty()) else {
        let hint = if app.mode.is_inactive() {
            "  Polling is paused. Press F5 to arm."
        } else {
            "  Waiting for option chain data..."
        };
        frame.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)).block(block),
            area,
        );
        return;
    };

    let header = Row::new(vec!["CALL BID", "CALL ASK", "STRIKE", "PUT BID", "PUT ASK"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = chain
        .rows()
        .iter()
        .map(|row| {
            Row::new(vec![
                price_cell(row.call_bid),
                price_cell(row.call_ask),
                Cell::from(format!("{:.2}", row.strike))
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                price_cell(row.put_bid),
                price_cell(row.put_ask),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
    ];
    frame.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn price_cell(value: Option<rust_decimal::Decimal>) -> Cell<'static> {
    match value {
        Some(v) => Cell::from(format!("{v:.2}")),
        None => Cell::from("-").style(Style::default().fg(Color::DarkGray)),
    }
}

fn draw_database(frame: &mut Frame, area: Rect, app: &App) {
    let [files_area, tables_area, trades_area] = Layout::horizontal([
        Constraint::Length(28),
        Constraint::Length(20),
        Constraint::Min(40),
    ])
    .areas(area);

    let files: Vec<ListItem> = app
        .db_files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let name = super::file_name_of(path);
            let mut style = Style::default();
            if name == app.db_file {
                style = style.add_modifier(Modifier::BOLD);
            }
            if i == app.db_selected {
                style = style.bg(Color::DarkGray);
            }
            ListItem::new(name).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(files).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Files (Enter opens) "),
        ),
        files_area,
    );

    let items: Vec<ListItem> = app
        .tables
        .iter()
        .map(|name| ListItem::new(name.clone()))
        .collect();
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(" Tables ")),
        tables_area,
    );

    let header = Row::new(vec!["ID", "SYMBOL", "QTY", "PRICE", "TIMESTAMP"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = app
        .trades
        .iter()
        .map(|t| {
            Row::new(vec![
                t.id.to_string(),
                t.symbol.clone(),
                t.qty.to_string(),
                format!("{:.2}", t.price),
                t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Min(19),
    ];
    frame.render_widget(
        Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(" Recent Trades ")),
        trades_area,
    );
}

fn draw_debug(frame: &mut Frame, area: Rect, app: &App) {
    let [config_area, log_area] =
        Layout::vertical([Constraint::Length(10), Constraint::Min(5)]).areas(area);

    let token_state = if app.config.session_token.is_some() {
        "present"
    } else {
        "not set"
    };
    let lines = vec![
        Line::raw(format!("  Version        {}", env!("CARGO_PKG_VERSION"))),
        Line::raw(format!("  Symbol         {}", app.config.symbol)),
        Line::raw(format!(
            "  Poll interval  {}s",
            app.config.poll_interval.as_secs()
        )),
        Line::raw(format!("  State dir      {}", app.config.state_dir.display())),
        Line::raw(format!("  Config file    {}", app.config.conf_path().display())),
        Line::raw(format!("  Timezone       {}", app.config.broker.timezone)),
        Line::raw(format!("  Alias          {}", app.config.broker.alias)),
        Line::raw(format!("  Session token  {token_state}")),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Runtime Configuration "),
        ),
        config_area,
    );

    let log_lines: Vec<Line> = app.log_tail.iter().map(|l| Line::raw(l.clone())).collect();
    frame.render_widget(
        Paragraph::new(log_lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Debug Log (tail) "),
        ),
        log_area,
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = app.notice.as_ref().map_or_else(
        || {
            Line::styled(
                " F5 mode  F4 hold  r refresh  t/d/g views  q quit",
                Style::default().fg(Color::DarkGray),
            )
        },
        |notice| {
            let style = match notice.severity {
                NoticeSeverity::Info => Style::default().fg(Color::Gray),
                NoticeSeverity::Warning => Style::default().fg(Color::Yellow),
                NoticeSeverity::Error => Style::default().fg(Color::Red),
            };
            Line::styled(format!(" {}", notice.message), style)
        },
    );

    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use rust_decimal_macros::dec;

    use crate::config::AppConfig;
    use crate::fanout::Notice;
    use crate::market::{OptionChainView, OptionRecord, OptionType, Symbol};

    use super::*;

    fn app() -> App {
        let dir = tempfile::tempdir().unwrap();
        App::new(AppConfig::load(dir.path()).unwrap())
    }

    fn rendered(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn mode_styles_are_distinct_per_state() {
        let styles = [
            mode_style(OperatingMode::Inactive, false),
            mode_style(OperatingMode::Simulation, false),
            mode_style(OperatingMode::Simulation, true),
            mode_style(OperatingMode::Live, false),
            mode_style(OperatingMode::Live, true),
        ];
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(
            mode_style(OperatingMode::Live, false).bg,
            Some(Color::Magenta)
        );
        assert_eq!(mode_style(OperatingMode::Live, true).bg, Some(Color::Yellow));
    }

    #[test]
    fn header_shows_mode_label_and_placeholder() {
        let mut app = app();
        app.mode = OperatingMode::Simulation;
        app.holding = true;

        let text = rendered(&app);
        assert!(text.contains("SIMULATION HOLD"));
        assert!(text.contains("awaiting data"));
    }

    #[test]
    fn header_shows_broker_status_and_database_file() {
        let mut app = app();
        app.config.session_token = None;

        let text = rendered(&app);
        assert!(text.contains("TT OFFLINE"));
        assert!(text.contains("FILE: spyscalp.db"));

        app.config.session_token = Some("token".to_string());
        let text = rendered(&app);
        assert!(text.contains("TT LINKED"));
    }

    #[test]
    fn database_view_shows_file_browser() {
        let mut app = app();
        app.view = ActiveView::Database;
        app.db_files = vec![
            std::path::PathBuf::from("/state/archive.db"),
            std::path::PathBuf::from("/state/spyscalp.db"),
        ];
        app.db_selected = 0;

        let text = rendered(&app);
        assert!(text.contains("Files (Enter opens)"));
        assert!(text.contains("archive.db"));
        assert!(text.contains("spyscalp.db"));
    }

    #[test]
    fn main_view_shows_quote_values() {
        let mut app = app();
        app.quote = Some(Quote::new(
            Symbol::new("SPY"),
            dec!(598.25),
            dec!(-1.10),
            42_000_000,
        ));

        let text = rendered(&app);
        assert!(text.contains("598.25"));
        assert!(text.contains("-1.10"));
        assert!(text.contains("42000000"));
    }

    #[test]
    fn trading_view_renders_chain_rows() {
        let mut app = app();
        app.view = ActiveView::Trading;
        app.chain = Some(OptionChainView::from_records(&[
            OptionRecord {
                strike: dec!(600),
                option_type: OptionType::Call,
                bid: dec!(1.10),
                ask: dec!(1.15),
                expiry: chrono::NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            },
            OptionRecord {
                strike: dec!(600),
                option_type: OptionType::Put,
                bid: dec!(0.95),
                ask: dec!(1.00),
                expiry: chrono::NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            },
        ]));

        let text = rendered(&app);
        assert!(text.contains("STRIKE"));
        assert!(text.contains("600.00"));
        assert!(text.contains("1.10"));
        assert!(text.contains("0.95"));
    }

    #[test]
    fn trading_view_without_chain_shows_hint() {
        let mut app = app();
        app.view = ActiveView::Trading;
        app.mode = OperatingMode::Simulation;

        let text = rendered(&app);
        assert!(text.contains("Waiting for option chain"));
    }

    #[test]
    fn database_view_lists_trades() {
        let mut app = app();
        app.view = ActiveView::Database;
        app.tables = vec!["trades".to_string()];
        app.trades = vec![crate::store::TradeRecord {
            id: 1,
            symbol: "SPY".to_string(),
            qty: -2,
            price: dec!(601.50),
            timestamp: Utc::now(),
        }];

        let text = rendered(&app);
        assert!(text.contains("trades"));
        assert!(text.contains("601.50"));
        assert!(text.contains("-2"));
    }

    #[test]
    fn footer_prefers_notice_over_key_help() {
        let mut app = app();
        app.notice = Some(Notice::error("Connection error: boom"));

        let text = rendered(&app);
        assert!(text.contains("Connection error: boom"));
        assert!(!text.contains("F5 mode"));
    }
}
