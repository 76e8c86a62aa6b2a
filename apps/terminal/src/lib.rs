// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Spyscalp Terminal - Core Library
//!
//! Terminal dashboard for monitoring SPY and its option chain, built
//! around a small set of cooperating tasks:
//!
//! - `mode`: operating-mode state machine (INACTIVE / SIMULATION / LIVE
//!   plus a hold flag), the single writer of trading posture
//! - `poll`: interval scheduler that fetches market data while armed and
//!   discards results that complete after a schedule change
//! - `market`: quote and option-chain types, the [`market::QuoteSource`]
//!   port, and the brokerage REST adapter
//! - `fanout`: broadcast hub distributing updates to display surfaces
//! - `store`: SQLite-backed trade persistence
//! - `ui`: ratatui presentation layer
//! - `config` / `startup` / `telemetry`: state-directory configuration,
//!   splash diagnostics, and file logging
//!
//! Mode is never persisted; every process starts INACTIVE.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod fanout;
pub mod market;
pub mod mode;
pub mod poll;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod ui;

pub use config::AppConfig;
pub use fanout::{SharedUpdateHub, UpdateHub};
pub use mode::{ModeController, OperatingMode};
pub use poll::{PollConfig, PollScheduler, SchedulerHandle};
pub use store::TradeStore;
