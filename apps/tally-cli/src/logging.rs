//! Tracing setup shared by both binaries.
//!
//! Logs go to stderr so stdout stays clean for tables, JSON and prompts.
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tally=debug,sqlx=warn";

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - ERROR: Bill generation failures, inventory left needing reconciliation
/// - WARN: Unreadable inventory file, ignored config values
/// - INFO: Bills archived, files saved
/// - DEBUG: Reloads, config overrides
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // try_init: a second call (tests) is a no-op instead of a panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
