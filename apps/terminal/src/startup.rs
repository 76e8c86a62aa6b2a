//! Startup diagnostics.
//!
//! A short splash sequence printed to stdout before the terminal UI takes
//! over: platform detection, WAN connectivity probes, state-directory
//! writability, and brokerage credential presence. Every check is
//! advisory; the terminal starts regardless of failures so the operator
//! can still browse local data offline.

use std::path::Path;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::AppConfig;

/// Banner printed above the check list.
const BANNER: &[&str] = &[
    r"   _____  _____  __     __  _____   _____          _      _____  ",
    r"  / ____||  __ \ \ \   / / / ____| / ____|   /\   | |    |  __ \ ",
    r" | (___  | |__) | \ \_/ / | (___  | |       /  \  | |    | |__) |",
    r"  \___ \ |  ___/   \   /   \___ \ | |      / /\ \ | |    |  ___/ ",
    r"  ____) || |        | |    ____) || |____ / ____ \| |____| |     ",
    r" |_____/ |_|        |_|   |_____/  \_____/_/    \_\______|_|     ",
];

/// Hosts probed for WAN connectivity; one reachable host is enough.
const PROBE_HOSTS: &[&str] = &["google.com", "kernel.org"];

/// Timeout for each connectivity probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of a single startup check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed, with detail.
    Ok(String),
    /// Check failed, with detail.
    Failed(String),
    /// Check did not apply, with reason.
    Skipped(String),
}

impl CheckStatus {
    /// Short bracketed tag for the splash output.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Ok(_) => "[OK]",
            Self::Failed(_) => "[FAIL]",
            Self::Skipped(_) => "[SKIPPED]",
        }
    }

    /// Detail or reason text.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Ok(s) | Self::Failed(s) | Self::Skipped(s) => s,
        }
    }
}

/// One named check result.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Check name shown on the splash screen.
    pub name: &'static str,
    /// Outcome.
    pub status: CheckStatus,
}

/// Run every startup check in order.
pub async fn run_checks(config: &AppConfig) -> Vec<CheckReport> {
    let reports = vec![
        check_os(),
        check_connectivity().await,
        check_writability(&config.state_dir),
        check_brokerage(config),
    ];

    for report in &reports {
        match &report.status {
            CheckStatus::Ok(detail) => info!(check = report.name, %detail, "startup check passed"),
            CheckStatus::Failed(detail) => {
                warn!(check = report.name, %detail, "startup check failed");
            }
            CheckStatus::Skipped(reason) => {
                info!(check = report.name, %reason, "startup check skipped");
            }
        }
    }

    reports
}

fn check_os() -> CheckReport {
    CheckReport {
        name: "OS/Platform Detection",
        status: CheckStatus::Ok(format!(
            "{} {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )),
    }
}

async fn check_connectivity() -> CheckReport {
    let mut reachable = Vec::new();
    for host in PROBE_HOSTS {
        if probe(host).await {
            reachable.push(*host);
        }
    }

    let status = if reachable.is_empty() {
        CheckStatus::Failed("no probe host reachable".to_string())
    } else {
        CheckStatus::Ok(format!("reached {}", reachable.join(", ")))
    };

    CheckReport {
        name: "WAN Connectivity",
        status,
    }
}

async fn probe(host: &str) -> bool {
    matches!(
        tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect((host, 443))).await,
        Ok(Ok(_))
    )
}

fn check_writability(state_dir: &Path) -> CheckReport {
    let probe_file = state_dir.join(".write_test");
    let status = match std::fs::write(&probe_file, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe_file);
            CheckStatus::Ok(state_dir.display().to_string())
        }
        Err(e) => CheckStatus::Failed(format!("{}: {e}", state_dir.display())),
    };

    CheckReport {
        name: "State Directory Writability",
        status,
    }
}

fn check_brokerage(config: &AppConfig) -> CheckReport {
    let status = if config.session_token.is_some() {
        CheckStatus::Ok("session token present".to_string())
    } else if config.broker.credentials.is_complete() {
        CheckStatus::Ok("credentials found".to_string())
    } else {
        CheckStatus::Skipped("missing credentials".to_string())
    };

    CheckReport {
        name: "Brokerage Connection",
        status,
    }
}

/// Print the banner and check results to stdout.
pub fn print_report(reports: &[CheckReport]) {
    for line in BANNER {
        println!("{line}");
    }
    println!();
    println!(
        "          QUANTITATIVE TRADING TERMINAL v{}",
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", "=".repeat(63));
    println!("\nInitialized System Checks...\n");

    for report in reports {
        println!("{:<44}.....{} {}", report.name, report.status.tag(), report.status.detail());
    }

    println!("\n{}", "=".repeat(63));
}

/// Block for up to `window` waiting for any key press.
///
/// Falls back to a plain sleep when the terminal cannot enter raw mode
/// (non-interactive stdin).
pub fn wait_for_key(window: Duration) {
    println!("Press any key to continue or wait {} seconds...", window.as_secs());

    if crossterm::terminal::enable_raw_mode().is_err() {
        std::thread::sleep(window);
        return;
    }

    let deadline = std::time::Instant::now() + window;
    while std::time::Instant::now() < deadline {
        match crossterm::event::poll(Duration::from_millis(100)) {
            Ok(true) => {
                let _ = crossterm::event::read();
                break;
            }
            Ok(false) => {}
            Err(_) => break,
        }
    }

    let _ = crossterm::terminal::disable_raw_mode();
}
