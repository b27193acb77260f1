//! # Domain Types
//!
//! Core domain types shared by the inventory manager and the billing tool.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InventoryItem  │   │    CartLine     │   │      Bill       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  barcode (key)  │──►│  barcode (snap) │──►│  id (BillId)    │       │
//! │  │  name           │   │  name    (snap) │   │  lines          │       │
//! │  │  quantity       │   │  quantity       │   │  totals         │       │
//! │  │  price          │   │  unit_price     │   │  created_at     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │    TaxRate      │   │   BillTotals    │                             │
//! │  │  bps (u32)      │   │  subtotal       │                             │
//! │  │  1800 = 18%     │   │  tax, grand     │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A [`CartLine`] copies name and price from the inventory row when it is
//! added. Later edits to the inventory do not change lines already in the
//! cart, and a [`Bill`] never changes once written.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::money::Money;
use crate::BILL_SHEET_PREFIX;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01%, so 1800 bps = 18% GST and the rate stays an
/// integer all the way through the tax calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Human percentage without trailing zeros: "18%", "8.25%", "12.5%".
    pub fn label(&self) -> String {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            format!("{}%", whole)
        } else if frac % 10 == 0 {
            format!("{}.{}%", whole, frac / 10)
        } else {
            format!("{}.{:02}%", whole, frac)
        }
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// One row of the inventory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique key of the table, compared as a string.
    pub barcode: String,

    /// Display name shown to the cashier and printed on bills.
    pub name: String,

    /// Units in stock. Never negative.
    pub quantity: i64,

    /// Unit price.
    pub price: Money,
}

impl InventoryItem {
    /// Case-insensitive substring match on barcode or name.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.barcode.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the billing cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Barcode at time of adding (frozen).
    pub barcode: String,

    /// Item name at time of adding (frozen).
    pub name: String,

    /// Units on this line (≥ 1).
    pub quantity: i64,

    /// Price at time of adding (frozen).
    pub unit_price: Money,
}

impl CartLine {
    /// Snapshots an inventory row into a cart line.
    pub fn from_item(item: &InventoryItem, quantity: i64) -> Self {
        CartLine {
            barcode: item.barcode.clone(),
            name: item.name.clone(),
            quantity,
            unit_price: item.price,
        }
    }

    /// unit price × quantity
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Bill Totals
// =============================================================================

/// Subtotal, tax and grand total of a cart or bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
    /// Whether tax was switched on for this cart.
    pub tax_applied: bool,
}

// =============================================================================
// Bill Id
// =============================================================================

/// Identifier of a finalized bill: `<YYYYmmdd_HHMMSS>_<6 hex chars>`.
///
/// ## Uniqueness
/// Seconds resolution plus a 24-bit random suffix. Two bills in the same
/// second collide with probability 1 in 16.7 million; the archive rejects a
/// duplicate id and the engine simply draws again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillId(String);

impl BillId {
    /// Generates a fresh id stamped with `now`.
    pub fn generate(now: DateTime<Local>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        BillId(format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &suffix[..6]))
    }

    /// Wraps an id read back from storage.
    pub fn from_string(id: impl Into<String>) -> Self {
        BillId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sheet name the bill is archived under (`Bill_<id>`).
    pub fn sheet_name(&self) -> String {
        format!("{}{}", BILL_SHEET_PREFIX, self.0)
    }
}

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A frozen line of a finalized bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub barcode: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&CartLine> for BillLine {
    fn from(line: &CartLine) -> Self {
        BillLine {
            barcode: line.barcode.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total(),
        }
    }
}

/// Column headers of a bill sheet.
pub const BILL_COLUMNS: [&str; 5] = ["Barcode", "Name", "Qty", "Unit Price", "Total"];

/// One rendered row of a bill sheet, every cell as text.
///
/// Summary rows leave barcode, name and qty blank, put their label in the
/// unit price column and the amount in the total column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRow {
    #[serde(rename = "Barcode")]
    pub barcode: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Qty")]
    pub qty: String,
    #[serde(rename = "Unit Price")]
    pub unit_price: String,
    #[serde(rename = "Total")]
    pub total: String,
}

impl BillRow {
    fn summary(label: &str, amount: Money) -> Self {
        BillRow {
            barcode: String::new(),
            name: String::new(),
            qty: String::new(),
            unit_price: label.to_string(),
            total: amount.to_string(),
        }
    }

    /// Cells in [`BILL_COLUMNS`] order.
    pub fn cells(&self) -> [&str; 5] {
        [
            self.barcode.as_str(),
            self.name.as_str(),
            self.qty.as_str(),
            self.unit_price.as_str(),
            self.total.as_str(),
        ]
    }
}

impl From<&BillLine> for BillRow {
    fn from(line: &BillLine) -> Self {
        BillRow {
            barcode: line.barcode.clone(),
            name: line.name.clone(),
            qty: line.quantity.to_string(),
            unit_price: line.unit_price.to_string(),
            total: line.line_total.to_string(),
        }
    }
}

/// Lays out item rows followed by the three summary rows.
pub fn bill_rows(lines: &[BillLine], totals: &BillTotals, tax_label: &str) -> Vec<BillRow> {
    let mut rows: Vec<BillRow> = lines.iter().map(BillRow::from).collect();
    rows.push(BillRow::summary("Subtotal", totals.subtotal));
    rows.push(BillRow::summary(tax_label, totals.tax));
    rows.push(BillRow::summary("Grand Total", totals.grand_total));
    rows
}

/// "GST (18%)"
pub fn tax_label(tax_name: &str, rate: TaxRate) -> String {
    format!("{} ({})", tax_name, rate.label())
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub lines: Vec<BillLine>,
    pub totals: BillTotals,
    pub tax_rate: TaxRate,
    /// Name printed in front of the rate on the tax row ("GST").
    pub tax_name: String,
    pub created_at: DateTime<Local>,
}

impl Bill {
    /// Freezes cart lines and totals into a bill.
    pub fn new(
        id: BillId,
        lines: &[CartLine],
        totals: BillTotals,
        tax_rate: TaxRate,
        tax_name: impl Into<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        Bill {
            id,
            lines: lines.iter().map(BillLine::from).collect(),
            totals,
            tax_rate,
            tax_name: tax_name.into(),
            created_at,
        }
    }

    pub fn sheet_name(&self) -> String {
        self.id.sheet_name()
    }

    pub fn tax_label(&self) -> String {
        tax_label(&self.tax_name, self.tax_rate)
    }

    /// Sheet layout: item rows then Subtotal / tax / Grand Total.
    pub fn rows(&self) -> Vec<BillRow> {
        bill_rows(&self.lines, &self.totals, &self.tax_label())
    }

    /// The three metadata cells stored beside the rows.
    pub fn metadata(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Bill ID:", self.id.to_string()),
            ("Date:", self.created_at.format("%Y-%m-%d").to_string()),
            ("Time:", self.created_at.format("%H:%M:%S").to_string()),
        ]
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
