//! # Store Error Types
//!
//! Error types for the inventory file, the bills archive and the finalize
//! protocol.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  io::Error / csv::Error / sqlx::Error                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds the path and categorization           │
//! │       │                                                                 │
//! │       ├──► BillingError::Generation (failures inside finalize)         │
//! │       ├──► BillingError::StockPending (archived, stock not yet saved)  │
//! │       ▼                                                                 │
//! │  CliError (in tally-cli) ← Error code + message                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Terminal shows a one-line message                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use tally_core::CoreError;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Inventory file lacks required columns.
    ///
    /// ## When This Occurs
    /// - Header row is missing `Barcode`, `Name`, `Quantity` or `Price`
    /// - File is empty but exists (no header at all)
    #[error("{}: missing required column(s): {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    /// A data row of the inventory file could not be parsed.
    ///
    /// ## When This Occurs
    /// - Quantity is not a whole number or is negative
    /// - Price is not a decimal amount
    /// - Barcode cell is empty
    #[error("{}: line {line}: {reason}", path.display())]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// File system error on a known path.
    ///
    /// ## When This Occurs
    /// - Directory not writable
    /// - Disk full
    /// - Backup source missing
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding error on a known path.
    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Bills archive could not be opened, read or appended.
    ///
    /// ## When This Occurs
    /// - Archive file locked by another process
    /// - Archive file is not a SQLite database
    /// - Trigger rejected a write to an existing sheet
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// Archive migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Entity not found in the archive.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Business rule violation raised while mutating the table.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Internal error (test doubles, poisoned locks).
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn csv(path: impl AsRef<Path>, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → StoreError::NotFound
/// Other                       → StoreError::Persistence
/// ```
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::not_found("Sheet", "unknown"),
            sqlx::Error::Database(db_err) => StoreError::Persistence(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Persistence("bills archive is busy (locked by another writer)".to_string())
            }
            _ => StoreError::Persistence(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Billing Error
// =============================================================================

/// Errors from the billing engine.
///
/// Rule violations found before anything is written come back as
/// [`BillingError::Domain`]. Anything that fails once the archive or the
/// inventory file is being written is wrapped in
/// [`BillingError::Generation`], except a stock write that fails after the
/// bill was archived, which is [`BillingError::StockPending`].
#[derive(Debug, Error)]
pub enum BillingError {
    /// Cart or stock rule (empty cart, unknown barcode, not enough stock).
    #[error(transparent)]
    Domain(CoreError),

    /// Store error outside the finalize protocol (reload, export).
    #[error(transparent)]
    Store(StoreError),

    /// Finalize failed while writing the archive or the inventory.
    #[error("Failed to generate bill: {cause}")]
    Generation {
        #[source]
        cause: StoreError,
    },

    /// The bill is in the archive but the stock decrement was not saved.
    ///
    /// ## When This Occurs
    /// - Inventory file became read-only or the disk filled up between the
    ///   archive append and the inventory write
    ///
    /// The engine keeps the decrement pending; the next `generate_bill`
    /// retries only the stock update and never archives the bill again.
    #[error("Bill archived as {sheet_name} but stock was not updated: {cause}; generate again to retry the stock update")]
    StockPending {
        sheet_name: String,
        #[source]
        cause: StoreError,
    },
}

impl BillingError {
    pub fn generation(cause: impl Into<StoreError>) -> Self {
        BillingError::Generation {
            cause: cause.into(),
        }
    }
}

impl From<CoreError> for BillingError {
    fn from(err: CoreError) -> Self {
        BillingError::Domain(err)
    }
}

/// Domain errors keep their category when they travel through the store.
impl From<StoreError> for BillingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(core) => BillingError::Domain(core),
            other => BillingError::Store(other),
        }
    }
}

/// Result type for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;
