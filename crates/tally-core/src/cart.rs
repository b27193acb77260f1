//! # Billing Cart
//!
//! The session-scoped list of pending lines. Nothing here touches disk; a
//! cart becomes durable only when the billing engine turns it into a
//! [`Bill`](crate::Bill).
//!
//! ## Stock Check
//! An add is checked against the stock in the given inventory snapshot minus
//! whatever the cart already holds for the same barcode. Adding 3 and then 3
//! more of an item with 5 in stock fails on the second add, instead of
//! failing later at bill generation.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::InventoryTable;
use crate::money::Money;
use crate::types::{BillTotals, CartLine, TaxRate};
use crate::validation::validate_quantity;

/// An in-progress sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    created_at: DateTime<Local>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Local::now(),
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Units of `barcode` already in the cart, across all lines.
    pub fn quantity_of(&self, barcode: &str) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.barcode == barcode)
            .map(|line| line.quantity)
            .sum()
    }

    /// Units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Appends a snapshot of `barcode` from `inventory`.
    ///
    /// ## Errors
    /// - [`CoreError::Validation`] for a quantity outside 1..=100000
    /// - [`CoreError::NotFound`] when the barcode is absent
    /// - [`CoreError::InsufficientStock`] when stock, less what the cart
    ///   already holds, does not cover `quantity`
    /// - [`CoreError::Validation`] when the cart total would overflow
    ///
    /// The cart is unchanged on any error.
    pub fn add_line(
        &mut self,
        inventory: &InventoryTable,
        barcode: &str,
        quantity: i64,
    ) -> CoreResult<CartLine> {
        validate_quantity(quantity)?;

        let item = inventory
            .find(barcode)
            .ok_or_else(|| CoreError::not_found(barcode))?;

        let available = item.quantity - self.quantity_of(barcode);
        if quantity > available {
            return Err(CoreError::InsufficientStock {
                barcode: barcode.to_string(),
                available: available.max(0),
                requested: quantity,
            });
        }

        // Tax is at most the subtotal, so the grand total needs twice the room.
        let fits = item
            .price
            .checked_mul(quantity)
            .and_then(|total| total.checked_add(self.subtotal()))
            .and_then(|subtotal| subtotal.checked_add(subtotal))
            .is_some();
        if !fits {
            return Err(ValidationError::OutOfRange {
                field: "cart total (in paise)".to_string(),
                min: 0,
                max: i64::MAX / 2,
            }
            .into());
        }

        let line = CartLine::from_item(item, quantity);
        self.lines.push(line.clone());
        Ok(line)
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Subtotal, tax and grand total.
    ///
    /// Tax is `rate` of the subtotal rounded half-up to the minor unit when
    /// `apply_tax` is set, zero otherwise.
    pub fn totals(&self, apply_tax: bool, rate: TaxRate) -> BillTotals {
        let subtotal = self.subtotal();
        let tax = if apply_tax {
            subtotal.calculate_tax(rate)
        } else {
            Money::zero()
        };

        BillTotals {
            subtotal,
            tax,
            grand_total: subtotal + tax,
            tax_applied: apply_tax,
        }
    }

    /// Empties the cart and restarts its clock.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Local::now();
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}
