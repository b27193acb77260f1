//! # CLI Error Type
//!
//! Unified error type for both binaries.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  Terminal                    Rust Backend                               │
//! │  ────────                    ────────────                               │
//! │                                                                         │
//! │  > add 8901 5                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Handler                                                 │  │
//! │  │  Result<String, CliError>                                        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store Error? ─── StoreError::Persistence("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule Violation? ─── CoreError::InsufficientStock ── CliError ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Error [INSUFFICIENT_STOCK]: Not enough stock for 8901! Available: 3    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The interactive session prints the message and keeps running. The
//! one-shot inventory commands print it and exit with status 1.

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_store::{BillingError, StoreError};

use crate::config::ConfigError;

/// Error returned by command handlers.
///
/// ## Serialization
/// With `--json` a failure is printed as:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Item not found: 8901"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Barcode or sheet not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Not enough stock for the requested quantity
    InsufficientStock,

    /// Cart operation failed (empty cart)
    CartError,

    /// Inventory file is malformed
    InventoryFormat,

    /// File or archive could not be read or written
    StorageError,

    /// Bill generation failed part way
    BillGeneration,

    /// Configuration could not be loaded
    ConfigError,

    /// Unknown or malformed command
    Usage,

    /// Internal error
    Internal,
}

impl CliError {
    /// Creates a new CLI error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Usage, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

/// Converts rule violations to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { barcode } => CliError::not_found("Item", &barcode),
            CoreError::InsufficientStock { .. } => {
                CliError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::NegativeQuantity { .. } => {
                CliError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::EmptyCart => CliError::new(ErrorCode::CartError, err.to_string()),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

/// Converts store errors to CLI errors.
impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Schema { .. } | StoreError::InvalidRow { .. } => {
                CliError::new(ErrorCode::InventoryFormat, err.to_string())
            }
            StoreError::Io { .. } | StoreError::Csv { .. } | StoreError::Persistence(_) => {
                CliError::new(ErrorCode::StorageError, err.to_string())
            }
            StoreError::Migration(e) => {
                tracing::error!("Archive migration failed: {}", e);
                CliError::new(ErrorCode::StorageError, "Bills archive migration failed")
            }
            StoreError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            StoreError::Domain(core) => core.into(),
            StoreError::Internal(e) => {
                tracing::error!("Internal store error: {}", e);
                CliError::internal("Internal error")
            }
        }
    }
}

/// Converts billing errors to CLI errors.
impl From<BillingError> for CliError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Domain(core) => core.into(),
            BillingError::Store(store) => store.into(),
            BillingError::Generation { .. } | BillingError::StockPending { .. } => {
                CliError::new(ErrorCode::BillGeneration, err.to_string())
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON encoding failed: {}", err);
        CliError::internal("Failed to encode output")
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;
