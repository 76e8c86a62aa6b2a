//! Terminal Configuration
//!
//! Settings come from two places, in order of precedence:
//!
//! 1. Environment variables (`SPYSCALP_SYMBOL`, `SPYSCALP_POLL_INTERVAL_SECS`,
//!    `TT_SESSION_TOKEN`, `SPYSCALP_STATE_DIR`).
//! 2. `SPYSCALP.conf` in the state directory, created with a default
//!    template on first run.
//!
//! The conf file is a loose `key = "value"` format with a free-text header;
//! lines without `=` are ignored, unknown keys are skipped. A hand-edited
//! file with stray text must never prevent startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::market::Symbol;

/// File name of the configuration file inside the state directory.
pub const CONF_FILE_NAME: &str = "SPYSCALP.conf";

/// Default state directory name under the user's home directory.
pub const STATE_DIR_NAME: &str = ".spyscalp";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No home directory could be resolved for the default state dir.
    #[error("cannot determine a home directory for {STATE_DIR_NAME}")]
    NoHomeDirectory,

    /// The state directory could not be created.
    #[error("cannot prepare state directory {path}: {source}")]
    StateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Error details.
        source: std::io::Error,
    },

    /// The default conf file could not be written.
    #[error("cannot write default configuration {path}: {source}")]
    WriteDefault {
        /// File that failed.
        path: PathBuf,
        /// Error details.
        source: std::io::Error,
    },
}

/// Brokerage OAuth credentials from the conf file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BrokerCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl BrokerCredentials {
    /// Create new credentials.
    #[must_use]
    pub const fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            client_id,
            client_secret,
            refresh_token,
        }
    }

    /// Get the OAuth client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the OAuth client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Get the refresh token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Whether every credential field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.client_id.is_empty()
            && !self.client_secret.is_empty()
            && !self.refresh_token.is_empty()
    }
}

impl std::fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("client_id", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Brokerage account settings from the conf file.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// OAuth credentials.
    pub credentials: BrokerCredentials,
    /// Display timezone name.
    pub timezone: String,
    /// Account alias, if set.
    pub alias: String,
    /// Account owner name, if set.
    pub owner_name: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            credentials: BrokerCredentials::default(),
            timezone: "America/New_York".to_string(),
            alias: String::new(),
            owner_name: String::new(),
        }
    }
}

/// Complete terminal configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// State directory holding the conf file, database, and log.
    pub state_dir: PathBuf,
    /// Monitored symbol.
    pub symbol: Symbol,
    /// Poll period.
    pub poll_interval: Duration,
    /// Brokerage settings from the conf file.
    pub broker: BrokerSettings,
    /// Pre-minted brokerage session token, if provided.
    pub session_token: Option<String>,
}

impl AppConfig {
    /// Load configuration for the given state directory.
    ///
    /// Creates the directory and a default `SPYSCALP.conf` when missing,
    /// then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::StateDir`] or [`ConfigError::WriteDefault`]
    /// when the first-run files cannot be created. A present but mangled
    /// conf file is not an error.
    pub fn load(state_dir: &Path) -> Result<Self, ConfigError> {
        if !state_dir.is_dir() {
            std::fs::create_dir_all(state_dir).map_err(|source| ConfigError::StateDir {
                path: state_dir.to_path_buf(),
                source,
            })?;
            info!(path = %state_dir.display(), "created state directory");
        }

        let conf_path = state_dir.join(CONF_FILE_NAME);
        if !conf_path.exists() {
            write_default_conf(&conf_path)?;
            info!(path = %conf_path.display(), "created default configuration");
        }

        let broker = match std::fs::read_to_string(&conf_path) {
            Ok(contents) => parse_conf(&contents),
            Err(e) => {
                warn!(path = %conf_path.display(), error = %e, "cannot read configuration, using defaults");
                BrokerSettings::default()
            }
        };

        let symbol = std::env::var("SPYSCALP_SYMBOL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map_or_else(|| Symbol::new("SPY"), Symbol::new);

        let poll_interval = parse_env_duration_secs(
            "SPYSCALP_POLL_INTERVAL_SECS",
            Duration::from_secs(5),
        );

        let session_token = std::env::var("TT_SESSION_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            symbol,
            poll_interval,
            broker,
            session_token,
        })
    }

    /// Load configuration from the default state directory.
    ///
    /// `SPYSCALP_STATE_DIR` overrides the `~/.spyscalp` default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDirectory`] when no home directory can
    /// be resolved, otherwise the errors of [`AppConfig::load`].
    pub fn load_default() -> Result<Self, ConfigError> {
        let state_dir = match std::env::var("SPYSCALP_STATE_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => directories::BaseDirs::new()
                .ok_or(ConfigError::NoHomeDirectory)?
                .home_dir()
                .join(STATE_DIR_NAME),
        };
        Self::load(&state_dir)
    }

    /// Path of the conf file.
    #[must_use]
    pub fn conf_path(&self) -> PathBuf {
        self.state_dir.join(CONF_FILE_NAME)
    }

    /// Whether enough brokerage material exists to build a market-data
    /// source: either a pre-minted session token or full OAuth credentials.
    #[must_use]
    pub fn has_broker_access(&self) -> bool {
        self.session_token.is_some() || self.broker.credentials.is_complete()
    }
}

fn write_default_conf(path: &Path) -> Result<(), ConfigError> {
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S");
    let content = format!(
        "SPYSCALP GLOBAL CONFIGURATION FILE\n\
         Last saved: {now} | Version: {version}\n\
         \n\
         [tt_globals]\n\
         tt-client-secret = \"\"\n\
         tt-client-ID = \"\"\n\
         tt-refresh-token = \"\"\n\
         tt-timezone = \"America/New_York\"\n\
         tt-alias = \"\"\n\
         tt-owner-name = \"\"\n",
        version = env!("CARGO_PKG_VERSION"),
    );
    std::fs::write(path, content).map_err(|source| ConfigError::WriteDefault {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse conf contents. Lines without `=` and unknown keys are ignored.
fn parse_conf(contents: &str) -> BrokerSettings {
    let mut settings = BrokerSettings::default();

    for line in contents.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');

        match key {
            "tt-client-secret" => settings.credentials.client_secret = value.to_string(),
            "tt-client-ID" => settings.credentials.client_id = value.to_string(),
            "tt-refresh-token" => settings.credentials.refresh_token = value.to_string(),
            "tt-timezone" if !value.is_empty() => settings.timezone = value.to_string(),
            "tt-alias" => settings.alias = value.to_string(),
            "tt-owner-name" => settings.owner_name = value.to_string(),
            _ => {}
        }
    }

    settings
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map_or(default, Duration::from_secs)
}
