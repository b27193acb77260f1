//! # Command Handlers
//!
//! Each binary parses its arguments with clap and hands off to a handler in
//! this module. Handlers return the text to print instead of writing to
//! stdout themselves, so they can be tested directly.
//!
//! ## Handler Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Command Structure                                 │
//! │                                                                         │
//! │  commands/                                                              │
//! │  ├── mod.rs        ← Shared flags and table formatting (this file)     │
//! │  ├── inventory.rs  ← tally-inventory subcommands                       │
//! │  └── billing.rs    ← tally-billing interactive session                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod billing;
pub mod inventory;

use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;
use tally_core::{BillRow, InventoryTable, BILL_COLUMNS};

use crate::config::AppConfig;
use crate::error::CliResult;

// =============================================================================
// Shared Flags
// =============================================================================

/// Path overrides accepted by both binaries.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Config file (default: platform config dir/tally.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Inventory CSV file
    #[arg(long, global = true)]
    pub inventory: Option<PathBuf>,

    /// Bills archive file
    #[arg(long, global = true)]
    pub bills: Option<PathBuf>,
}

impl PathArgs {
    /// Loads the config and applies the path flags on top.
    pub fn load_config(&self) -> CliResult<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        config.override_paths(self.inventory.clone(), self.bills.clone());
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Table Formatting
// =============================================================================

/// Renders rows as a left-aligned text table with a header rule.
pub fn render_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &widths, headers.iter().copied());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &widths, rule.iter().map(String::as_str));
    for row in rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// Inventory listing with currency-formatted prices.
pub fn format_inventory(table: &InventoryTable, currency: &str) -> String {
    if table.is_empty() {
        return "No items.\n".to_string();
    }
    let rows: Vec<[String; 4]> = table
        .iter()
        .map(|item| {
            [
                item.barcode.clone(),
                item.name.clone(),
                item.quantity.to_string(),
                item.price.with_symbol(currency),
            ]
        })
        .collect();
    render_table(["Barcode", "Name", "Quantity", "Price"], &rows)
}

/// Bill layout: item rows followed by the summary rows.
pub fn format_bill_rows(rows: &[BillRow]) -> String {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| row.cells().map(str::to_string))
        .collect();
    render_table(BILL_COLUMNS, &cells)
}
