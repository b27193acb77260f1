//! # tally-cli: Terminal Front Ends for Tally POS
//!
//! Shared code behind the `tally-inventory` and `tally-billing` binaries.
//!
//! ## Module Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       tally-cli Structure                               │
//! │                                                                         │
//! │  bin/tally-inventory.rs ──┐        bin/tally-billing.rs ──┐            │
//! │                           ▼                               ▼            │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │ commands/   inventory.rs (subcommands)  billing.rs (session)   │    │
//! │  └──────────────────────────────┬─────────────────────────────────┘    │
//! │                                 │                                       │
//! │        ┌────────────────┬───────┴────────┬─────────────────┐           │
//! │        ▼                ▼                ▼                 ▼           │
//! │    config.rs        error.rs        logging.rs        tally-store      │
//! │    AppConfig        CliError        init_tracing                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, ConfigError};
pub use error::{CliError, CliResult, ErrorCode};
