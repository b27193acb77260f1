//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate holds the rules of the inventory manager and the billing tool
//! as plain data and pure functions. Files, the bills archive and the
//! terminal all live in other crates.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              tally-inventory / tally-billing (CLI)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tally-store (inventory file, archive, engine)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────────┐   │   │
//! │  │  │   money   │ │ inventory │ │   cart    │ │  validation   │   │   │
//! │  │  │   Money   │ │  Table    │ │   Cart    │ │   ItemForm    │   │   │
//! │  │  │  TaxRate  │ │  upsert   │ │  totals   │ │   rules       │   │   │
//! │  │  └───────────┘ └───────────┘ └───────────┘ └───────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, CartLine, Bill, TaxRate)
//! - [`money`] - Money type with integer arithmetic
//! - [`inventory`] - The in-memory inventory table and its mutation rules
//! - [`cart`] - The billing session cart
//! - [`error`] - Domain error types
//! - [`validation`] - Form validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{Cart, InventoryTable, Money, TaxRate};
//!
//! let mut table = InventoryTable::new();
//! table.upsert("B1", "Rice 1kg", 10, Money::from_cents(1000)).unwrap();
//! table.upsert("B2", "Salt", 4, Money::from_cents(500)).unwrap();
//!
//! let mut cart = Cart::new();
//! cart.add_line(&table, "B1", 2).unwrap();
//! cart.add_line(&table, "B2", 1).unwrap();
//!
//! let totals = cart.totals(true, TaxRate::from_bps(1800));
//! assert_eq!(totals.subtotal.cents(), 2500);
//! assert_eq!(totals.tax.cents(), 450);
//! assert_eq!(totals.grand_total.cents(), 2950);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod inventory;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{InventoryTable, MissingItemPolicy, StockChange, UpsertOutcome};
pub use money::Money;
pub use types::*;
pub use validation::ItemForm;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default GST rate: 18%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;

/// Default name printed in front of the tax rate on bills ("GST (18%)").
pub const DEFAULT_TAX_NAME: &str = "GST";

/// Largest quantity accepted by the item form.
pub const MAX_ITEM_QUANTITY: i64 = 100_000;

/// Smallest accepted unit price (0.01).
pub const MIN_PRICE_CENTS: i64 = 1;

/// Largest accepted unit price (1,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Prefix of every bill sheet name in the archive.
pub const BILL_SHEET_PREFIX: &str = "Bill_";
