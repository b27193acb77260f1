//! # Billing Engine
//!
//! Drives one billing session: the cart, stock checks against the inventory
//! file, and the finalize protocol that turns a cart into an archived bill.
//!
//! ## Finalize Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate_bill(apply_tax)                    state: Open → Finalizing   │
//! │                                                                         │
//! │  0. stock pending from an earlier bill? ──► retry step 5 only          │
//! │     cart empty?  ──► EmptyCart (nothing changes)                       │
//! │  1. reload inventory, dry-run the deduction   ──► Domain error         │
//! │     (revalidate_stock)                           (nothing written)     │
//! │  2. totals + fresh bill id (redrawn if the archive already has it)     │
//! │  3. archive.append_bill          ──► Generation { cause }              │
//! │  4. clear cart (the sale is on record from here on)                    │
//! │  5. deduct + persist inventory   ──► StockPending { sheet, cause }     │
//! │  6. done                                     state: Finalizing → Open   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stale Stock
//! With `revalidate_stock` on (the default) the inventory is re-read right
//! before finalizing and every line must still be covered; a shortage
//! aborts before anything is written. With it off, stock is deducted from
//! the snapshot taken at the last add and written back as is (last writer
//! wins); barcodes missing from that snapshot are skipped.
//!
//! ## Failed Finalize
//! Before the archive append the cart is kept so the cashier can retry,
//! unless `clear_cart_on_failure` is set. Once the bill is archived the cart
//! is always cleared. If the inventory write then fails, the decrement stays
//! pending on the engine: the next `generate_bill` retries only the stock
//! update for that bill and never appends it to the archive a second time.

use std::path::Path;

use chrono::Local;
use serde::Serialize;
use tally_core::{
    bill_rows, tax_label, Bill, BillId, BillLine, BillRow, BillTotals, Cart, CartLine, CoreError,
    InventoryTable, MissingItemPolicy, StockChange, TaxRate, DEFAULT_TAX_NAME,
};
use tracing::{debug, error, info, warn};

use crate::archive::BillsArchive;
use crate::backend::InventoryBackend;
use crate::error::{BillingError, BillingResult, StoreError, StoreResult};
use crate::export::export_bill_csv;
use crate::repository::InventoryRepository;

/// Attempts at drawing a bill id the archive has not seen.
const BILL_ID_ATTEMPTS: usize = 5;

// =============================================================================
// Policy & State
// =============================================================================

/// Session rules for the billing engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingPolicy {
    pub tax_rate: TaxRate,
    /// Printed before the rate on the tax row ("GST").
    pub tax_name: String,
    /// Empty the cart even when finalize fails.
    pub clear_cart_on_failure: bool,
    /// Re-read and re-check stock right before finalizing.
    pub revalidate_stock: bool,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        BillingPolicy {
            tax_rate: TaxRate::default(),
            tax_name: DEFAULT_TAX_NAME.to_string(),
            clear_cart_on_failure: false,
            revalidate_stock: true,
        }
    }
}

/// Where the engine is in the finalize protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Open,
    Finalizing,
}

/// Result of a successful finalize.
#[derive(Debug, Clone)]
pub struct GeneratedBill {
    pub bill: Bill,
    /// Sheet the bill was archived under.
    pub sheet_name: String,
    pub stock_changes: Vec<StockChange>,
}

// =============================================================================
// Engine
// =============================================================================

/// An archived bill whose stock decrement has not been saved yet.
#[derive(Debug, Clone)]
struct PendingStock {
    bill: Bill,
    sheet_name: String,
    lines: Vec<CartLine>,
    missing: MissingItemPolicy,
}

/// Billing session over an inventory backend and the bills archive.
pub struct BillingEngine<B> {
    inventory: InventoryRepository<B>,
    archive: BillsArchive,
    cart: Cart,
    policy: BillingPolicy,
    state: EngineState,
    pending: Option<PendingStock>,
}

impl<B: InventoryBackend> BillingEngine<B> {
    pub fn new(inventory: InventoryRepository<B>, archive: BillsArchive, policy: BillingPolicy) -> Self {
        BillingEngine {
            inventory,
            archive,
            cart: Cart::new(),
            policy,
            state: EngineState::Open,
            pending: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn inventory(&self) -> &InventoryRepository<B> {
        &self.inventory
    }

    pub fn archive(&self) -> &BillsArchive {
        &self.archive
    }

    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    /// Sheet of an archived bill still waiting for its stock update.
    pub fn pending_sheet(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.sheet_name.as_str())
    }

    /// "GST (18%)"
    pub fn tax_label(&self) -> String {
        tax_label(&self.policy.tax_name, self.policy.tax_rate)
    }

    /// Re-reads the inventory and adds a line for `barcode`.
    ///
    /// ## Errors
    /// `NotFound` / `InsufficientStock` / `Validation` as
    /// [`BillingError::Domain`]; a failed reload as [`BillingError::Store`].
    /// The cart is unchanged on error.
    pub fn add_item(&mut self, barcode: &str, quantity: i64) -> BillingResult<CartLine> {
        self.inventory.reload()?;
        let line = self.cart.add_line(self.inventory.table(), barcode, quantity)?;
        debug!(barcode = %barcode, quantity, cart_lines = self.cart.len(), "Added to cart");
        Ok(line)
    }

    /// Re-reads the inventory and filters it.
    pub fn search_inventory(&mut self, query: &str) -> StoreResult<InventoryTable> {
        self.inventory.reload()?;
        Ok(self.inventory.search(query))
    }

    pub fn totals(&self, apply_tax: bool) -> BillTotals {
        self.cart.totals(apply_tax, self.policy.tax_rate)
    }

    /// The cart laid out as a bill sheet, summary rows included.
    pub fn preview_rows(&self, apply_tax: bool) -> Vec<BillRow> {
        let lines: Vec<BillLine> = self.cart.lines().iter().map(BillLine::from).collect();
        bill_rows(&lines, &self.totals(apply_tax), &self.tax_label())
    }

    /// Writes the cart preview to `path` as CSV.
    pub fn export_cart_csv(&self, path: &Path, apply_tax: bool) -> BillingResult<usize> {
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        Ok(export_bill_csv(&self.preview_rows(apply_tax), path)?)
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Finalizes the cart into an archived bill.
    ///
    /// While a stock update is pending this only retries that update and
    /// returns the already archived bill; the current cart is left alone.
    pub async fn generate_bill(&mut self, apply_tax: bool) -> BillingResult<GeneratedBill> {
        if let Some(pending) = self.pending.take() {
            return self.retry_pending_stock(pending);
        }
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        self.state = EngineState::Finalizing;
        let result = self.finalize(apply_tax).await;
        self.state = EngineState::Open;

        match &result {
            Ok(generated) => {
                info!(
                    bill_id = %generated.bill.id,
                    sheet = %generated.sheet_name,
                    grand_total = %generated.bill.totals.grand_total,
                    "Bill generated"
                );
            }
            // Already archived; the cart was cleared and the error logged.
            Err(BillingError::StockPending { .. }) => {}
            Err(e) => {
                warn!(error = %e, "Bill generation failed");
                if self.policy.clear_cart_on_failure {
                    self.cart.clear();
                }
            }
        }
        result
    }

    fn retry_pending_stock(&mut self, pending: PendingStock) -> BillingResult<GeneratedBill> {
        match self.inventory.apply_sale(&pending.lines, pending.missing) {
            Ok(stock_changes) => {
                info!(
                    bill_id = %pending.bill.id,
                    sheet = %pending.sheet_name,
                    "Pending stock update applied"
                );
                Ok(GeneratedBill {
                    bill: pending.bill,
                    sheet_name: pending.sheet_name,
                    stock_changes,
                })
            }
            Err(e) => Err(self.hold_pending(pending, e)),
        }
    }

    fn hold_pending(&mut self, pending: PendingStock, cause: StoreError) -> BillingError {
        error!(
            bill_id = %pending.bill.id,
            sheet = %pending.sheet_name,
            error = %cause,
            "Bill archived but stock was not updated; retry pending"
        );
        let sheet_name = pending.sheet_name.clone();
        self.pending = Some(pending);
        BillingError::StockPending { sheet_name, cause }
    }

    async fn finalize(&mut self, apply_tax: bool) -> BillingResult<GeneratedBill> {
        let lines = self.cart.lines().to_vec();

        let missing = if self.policy.revalidate_stock {
            self.inventory.reload()?;
            self.inventory
                .table()
                .clone()
                .deduct(&lines, MissingItemPolicy::Reject)?;
            MissingItemPolicy::Reject
        } else {
            MissingItemPolicy::Skip
        };

        let totals = self.totals(apply_tax);
        let id = self.fresh_bill_id().await?;
        let bill = Bill::new(
            id,
            &lines,
            totals,
            self.policy.tax_rate,
            self.policy.tax_name.clone(),
            Local::now(),
        );

        let sheet_name = self
            .archive
            .append_bill(&bill)
            .await
            .map_err(BillingError::generation)?;

        self.cart.clear();

        match self.inventory.apply_sale(&lines, missing) {
            Ok(stock_changes) => Ok(GeneratedBill {
                bill,
                sheet_name,
                stock_changes,
            }),
            Err(e) => {
                let pending = PendingStock {
                    bill,
                    sheet_name,
                    lines,
                    missing,
                };
                Err(self.hold_pending(pending, e))
            }
        }
    }

    async fn fresh_bill_id(&self) -> BillingResult<BillId> {
        for _ in 0..BILL_ID_ATTEMPTS {
            let id = BillId::generate(Local::now());
            let taken = self
                .archive
                .contains_bill_id(id.as_str())
                .await
                .map_err(BillingError::generation)?;
            if !taken {
                return Ok(id);
            }
            warn!(bill_id = %id, "Bill id already archived, drawing again");
        }
        Err(BillingError::generation(StoreError::Internal(
            "could not draw an unused bill id".to_string(),
        )))
    }
}
