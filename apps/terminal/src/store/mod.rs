//! Trade store.
//!
//! SQLite-backed persistence for executed trades, kept alongside the
//! terminal's other state files. The schema is intentionally tiny; the
//! database screen reads it back verbatim for display.
//!
//! Timestamps are stored as RFC 3339 text so the file stays inspectable
//! with any SQLite shell.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use thiserror::Error;
use tracing::{debug, info};
use turso::{Builder, Connection, Database, Value};

/// File name of the trade database inside the state directory.
pub const DB_FILE_NAME: &str = "spyscalp.db";

/// Errors surfaced by the trade store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("trade database error: {source}")]
    Database {
        /// Error details.
        #[from]
        source: turso::Error,
    },

    /// The state directory could not be created.
    #[error("cannot prepare state directory {path}: {source}")]
    StateDir {
        /// Directory that failed.
        path: PathBuf,
        /// Error details.
        source: std::io::Error,
    },

    /// A stored row did not match the expected shape.
    #[error("corrupt trade row: {message}")]
    Corrupt {
        /// What was wrong.
        message: String,
    },
}

/// One executed (or simulated) trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    /// Row id.
    pub id: i64,
    /// Traded symbol.
    pub symbol: String,
    /// Signed quantity; negative is a sell.
    pub qty: i64,
    /// Fill price.
    pub price: Decimal,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
}

/// Handle to the trade database.
pub struct TradeStore {
    _db: Database,
    conn: Connection,
}

impl TradeStore {
    /// Open (creating if needed) the trade database at `path` and make
    /// sure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] when the file cannot be opened or
    /// the schema statement fails.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Builder::new_local(path.to_string_lossy().as_ref())
            .build()
            .await?;
        let conn = db.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY,
                symbol TEXT,
                qty INTEGER,
                price REAL,
                timestamp TEXT
            )",
            (),
        )
        .await?;

        debug!(path = %path.display(), "trade store opened");
        Ok(Self { _db: db, conn })
    }

    /// Open the store in its default location under `state_dir`, creating
    /// the directory and database file on first run.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StateDir`] when the directory cannot be
    /// created, otherwise the errors of [`TradeStore::open`].
    pub async fn open_default(state_dir: &Path) -> Result<Self, StoreError> {
        if !state_dir.is_dir() {
            std::fs::create_dir_all(state_dir).map_err(|source| StoreError::StateDir {
                path: state_dir.to_path_buf(),
                source,
            })?;
            info!(path = %state_dir.display(), "created state directory");
        }
        Self::open(&state_dir.join(DB_FILE_NAME)).await
    }

    /// Record one trade, returning its row id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] when the price cannot be stored as
    /// a float, otherwise database errors.
    pub async fn insert_trade(
        &self,
        symbol: &str,
        qty: i64,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let price = price.to_f64().ok_or_else(|| StoreError::Corrupt {
            message: format!("price {price} is not representable"),
        })?;

        self.conn
            .execute(
                "INSERT INTO trades (symbol, qty, price, timestamp) VALUES (?1, ?2, ?3, ?4)",
                (symbol, qty, price, timestamp.to_rfc3339()),
            )
            .await?;

        Ok(self.conn.last_insert_rowid())
    }

    /// The most recent trades, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] when a stored row does not decode.
    pub async fn recent_trades(&self, limit: u32) -> Result<Vec<TradeRecord>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, symbol, qty, price, timestamp
                 FROM trades ORDER BY id DESC LIMIT ?1",
                (i64::from(limit),),
            )
            .await?;

        let mut trades = Vec::new();
        while let Some(row) = rows.next().await? {
            trades.push(TradeRecord {
                id: integer(&row.get_value(0)?, "id")?,
                symbol: text(&row.get_value(1)?, "symbol")?,
                qty: integer(&row.get_value(2)?, "qty")?,
                price: price_from(&row.get_value(3)?)?,
                timestamp: timestamp_from(&row.get_value(4)?)?,
            });
        }
        Ok(trades)
    }

    /// Total number of recorded trades.
    ///
    /// # Errors
    ///
    /// Returns database errors and [`StoreError::Corrupt`] on a malformed
    /// count result.
    pub async fn trade_count(&self) -> Result<i64, StoreError> {
        let mut rows = self.conn.query("SELECT COUNT(*) FROM trades", ()).await?;
        match rows.next().await? {
            Some(row) => integer(&row.get_value(0)?, "count"),
            None => Ok(0),
        }
    }

    /// Names of the user tables in the database file.
    ///
    /// Shown on the database screen as a quick integrity signal.
    ///
    /// # Errors
    ///
    /// Returns database errors and [`StoreError::Corrupt`] on malformed
    /// catalog rows.
    pub async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT name FROM sqlite_schema WHERE type = 'table' ORDER BY name",
                (),
            )
            .await?;

        let mut names = Vec::new();
        while let Some(row) = rows.next().await? {
            names.push(text(&row.get_value(0)?, "name")?);
        }
        Ok(names)
    }
}

/// Database files (`.db` / `.sqlite`) directly under `dir`, sorted by name.
///
/// Feeds the database screen's file browser. A missing or unreadable
/// directory yields an empty list.
#[must_use]
pub fn list_database_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ext.eq_ignore_ascii_case("db") || ext.eq_ignore_ascii_case("sqlite")
                    })
        })
        .collect();
    files.sort();
    files
}

fn integer(value: &Value, column: &str) -> Result<i64, StoreError> {
    match value {
        Value::Integer(v) => Ok(*v),
        other => Err(StoreError::Corrupt {
            message: format!("column {column} holds {other:?}, expected integer"),
        }),
    }
}

fn text(value: &Value, column: &str) -> Result<String, StoreError> {
    match value {
        Value::Text(v) => Ok(v.clone()),
        other => Err(StoreError::Corrupt {
            message: format!("column {column} holds {other:?}, expected text"),
        }),
    }
}

fn price_from(value: &Value) -> Result<Decimal, StoreError> {
    let raw = match value {
        Value::Real(v) => *v,
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(v) => *v as f64,
        other => {
            return Err(StoreError::Corrupt {
                message: format!("column price holds {other:?}, expected real"),
            });
        }
    };
    Decimal::from_f64(raw).ok_or_else(|| StoreError::Corrupt {
        message: format!("price {raw} is not a finite number"),
    })
}

fn timestamp_from(value: &Value) -> Result<DateTime<Utc>, StoreError> {
    let raw = text(value, "timestamp")?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            message: format!("timestamp {raw:?} does not parse: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    async fn store_in(dir: &tempfile::TempDir) -> TradeStore {
        TradeStore::open(&dir.path().join(DB_FILE_NAME))
            .await
            .unwrap()
    }

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 31, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn creates_trades_table_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let tables = store.table_names().await.unwrap();
        assert!(tables.contains(&"trades".to_string()));
        assert_eq!(store.trade_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn insert_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        let id = store
            .insert_trade("SPY", 2, dec!(598.25), ts(14))
            .await
            .unwrap();
        assert!(id > 0);

        let trades = store.recent_trades(10).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "SPY");
        assert_eq!(trades[0].qty, 2);
        assert_eq!(trades[0].price, dec!(598.25));
        assert_eq!(trades[0].timestamp, ts(14));
    }

    #[tokio::test]
    async fn recent_trades_newest_first_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        for hour in 9..14 {
            store
                .insert_trade("SPY", 1, dec!(500), ts(hour))
                .await
                .unwrap();
        }

        let trades = store.recent_trades(3).await.unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].timestamp, ts(13));
        assert_eq!(trades[2].timestamp, ts(11));
        assert_eq!(store.trade_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn negative_qty_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store
            .insert_trade("SPY", -3, dec!(601.50), ts(15))
            .await
            .unwrap();

        let trades = store.recent_trades(1).await.unwrap();
        assert_eq!(trades[0].qty, -3);
    }

    #[test]
    fn list_database_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("zeta.db"), b"").unwrap();
        std::fs::write(dir.path().join("alpha.sqlite"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested.db")).unwrap();

        let files = list_database_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, vec!["alpha.sqlite", "zeta.db"]);
    }

    #[test]
    fn list_database_files_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_database_files(&dir.path().join("absent")).is_empty());
    }

    #[tokio::test]
    async fn open_default_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");
        let store = TradeStore::open_default(&state_dir).await.unwrap();

        assert!(state_dir.join(DB_FILE_NAME).exists());
        assert_eq!(store.trade_count().await.unwrap(), 0);
    }
}
