//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Inventory / cart rule violations               │
//! │  └── ValidationError  - Form input failures                            │
//! │                                                                         │
//! │  tally-store errors (separate crate)                                   │
//! │  ├── StoreError       - Inventory file and archive failures            │
//! │  └── BillingError     - Finalize protocol failures                     │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── CliError         - What the terminal shows                        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → CliError → stderr    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the inventory table and the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No inventory row carries this barcode.
    #[error("Item not found: {barcode}")]
    NotFound { barcode: String },

    /// Requested more units than are in stock.
    ///
    /// ## User Workflow
    /// ```text
    /// add 8901 (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { barcode: "8901", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Terminal shows: "Not enough stock for 8901! Available: 3"
    /// ```
    #[error("Not enough stock for {barcode}! Available: {available}, requested: {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// A stock change would leave a negative quantity.
    #[error("Quantity cannot be negative: {barcode} has {current}, change of {delta} rejected")]
    NegativeQuantity {
        barcode: String,
        current: i64,
        delta: i64,
    },

    /// A bill was requested for an empty cart.
    #[error("Cart is empty!")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a barcode.
    pub fn not_found(barcode: impl Into<String>) -> Self {
        CoreError::NotFound {
            barcode: barcode.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while building an [`ItemForm`](crate::ItemForm) or parsing
/// amounts, before any business rule runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. "12,50" for a price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            barcode: "8901".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Not enough stock for 8901! Available: 3, requested: 5"
        );
        assert_eq!(CoreError::EmptyCart.to_string(), "Cart is empty!");
        assert_eq!(CoreError::not_found("X1").to_string(), "Item not found: X1");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: 100_000,
        };
        assert_eq!(err.to_string(), "quantity must be between 1 and 100000");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
