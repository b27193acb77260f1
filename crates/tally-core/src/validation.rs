//! # Validation Module
//!
//! Input validation for the item form and the billing prompt.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI argument parsing (clap)                                  │
//! │  └── Types only: quantity is an integer, price is text                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── ItemForm::new → barcode/name present, quantity & price in range   │
//! │  └── validate_quantity for cart adds                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: InventoryTable / Cart rules                                  │
//! │  └── Stock never negative, stock available                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::ItemForm;
//! use tally_core::Money;
//!
//! let form = ItemForm::new("8901030", "Soap", 12, Money::from_cents(4500)).unwrap();
//! assert_eq!(form.barcode(), "8901030");
//!
//! assert!(ItemForm::new("", "Soap", 12, Money::from_cents(4500)).is_err());
//! assert!(ItemForm::new("8901030", "Soap", 0, Money::from_cents(4500)).is_err());
//! ```

use serde::Serialize;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MIN_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_BARCODE_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;
const MAX_QUERY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a barcode and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - No whitespace or control characters, so a barcode is always a single
///   word on the billing prompt
pub fn validate_barcode(barcode: &str) -> ValidationResult<String> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if barcode.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain spaces or control characters".to_string(),
        });
    }

    Ok(barcode.to_string())
}

/// Validates an item name and returns it trimmed.
pub fn validate_item_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query. Empty is allowed and means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity entered on a form or at the billing prompt.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (100000)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price: 0.01 to 1,000,000.00.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    if price.cents() < MIN_PRICE_CENTS || price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price (in paise)".to_string(),
            min: MIN_PRICE_CENTS,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Item Form
// =============================================================================

/// Validated add/update request for the inventory.
///
/// Fields are private so a form can only exist in a valid state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemForm {
    barcode: String,
    name: String,
    quantity: i64,
    price: Money,
}

impl ItemForm {
    /// Builds a form, trimming text fields and checking every rule.
    pub fn new(
        barcode: &str,
        name: &str,
        quantity: i64,
        price: Money,
    ) -> ValidationResult<Self> {
        let barcode = validate_barcode(barcode)?;
        let name = validate_item_name(name)?;
        validate_quantity(quantity)?;
        validate_price(price)?;

        Ok(ItemForm {
            barcode,
            name,
            quantity,
            price,
        })
    }

    /// Builds a form from raw text, as typed into a prompt.
    pub fn parse(barcode: &str, name: &str, quantity: &str, price: &str) -> ValidationResult<Self> {
        let quantity: i64 = quantity
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: format!("'{}' is not a whole number", quantity.trim()),
            })?;
        let price: Money = price.parse().map_err(|_| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("'{}' is not a decimal amount", price.trim()),
        })?;

        ItemForm::new(barcode, name, quantity, price)
    }

    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn price(&self) -> Money {
        self.price
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
