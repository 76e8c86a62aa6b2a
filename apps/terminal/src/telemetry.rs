//! Tracing setup.
//!
//! Structured logs go to a file in the state directory, never to stdout:
//! once the UI owns the terminal, any stray writes would corrupt the
//! display. `RUST_LOG` overrides the default filter.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// File name of the debug log inside the state directory.
pub const LOG_FILE_NAME: &str = "spyscalp_debug.log";

/// Telemetry initialization error.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log file could not be opened for appending.
    #[error("cannot open log file {path}: {source}")]
    LogFile {
        /// File that failed.
        path: PathBuf,
        /// Error details.
        source: std::io::Error,
    },
}

/// Initialize the global tracing subscriber, appending to the debug log
/// under `state_dir`.
///
/// Call once at startup, before the splash checks run.
///
/// # Errors
///
/// Returns [`TelemetryError::LogFile`] when the log file cannot be
/// opened.
pub fn init(state_dir: &Path) -> Result<(), TelemetryError> {
    let path = state_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| TelemetryError::LogFile {
            path: path.clone(),
            source,
        })?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spyscalp_terminal=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}

/// Open the log file for appending without installing a subscriber.
///
/// Used by the debug screen to resolve the log path consistently.
#[must_use]
pub fn log_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOG_FILE_NAME)
}

/// Read the last `lines` lines of the debug log, oldest first.
///
/// Returns an empty list when the log does not exist yet.
#[must_use]
pub fn tail_log(state_dir: &Path, lines: usize) -> Vec<String> {
    let Ok(contents) = std::fs::read_to_string(state_dir.join(LOG_FILE_NAME)) else {
        return Vec::new();
    };

    let all: Vec<&str> = contents.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_log_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tail_log(dir.path(), 10).is_empty());
    }

    #[test]
    fn tail_log_returns_last_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let contents = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>();
        std::fs::write(dir.path().join(LOG_FILE_NAME), contents.join("\n")).unwrap();

        let tail = tail_log(dir.path(), 3);
        assert_eq!(tail, vec!["line 8", "line 9", "line 10"]);
    }

    #[test]
    fn log_path_is_inside_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(log_path(dir.path()), dir.path().join(LOG_FILE_NAME));
    }
}
