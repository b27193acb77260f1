//! # Inventory Repository
//!
//! Owns a loaded snapshot of the inventory and writes it back through an
//! [`InventoryBackend`] after every mutation.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert / delete / apply_sale                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stale?  ── yes ──► reload() from backend                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  clone snapshot ──► mutate clone (rules in tally-core)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  backend.save(clone)                                                   │
//! │       ├── Ok  ──► clone becomes the snapshot                           │
//! │       └── Err ──► snapshot untouched, marked stale                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed save leaves the file in an unknown state, so the repository
//! stops trusting its snapshot and reloads before the next mutation.

use tally_core::{
    CartLine, InventoryTable, ItemForm, MissingItemPolicy, StockChange, UpsertOutcome,
};
use tracing::{debug, info, warn};

use crate::backend::InventoryBackend;
use crate::error::StoreResult;

/// Repository over the inventory table.
#[derive(Debug)]
pub struct InventoryRepository<B> {
    backend: B,
    table: InventoryTable,
    stale: bool,
}

impl<B: InventoryBackend> InventoryRepository<B> {
    /// Loads the table from `backend`.
    pub fn open(backend: B) -> StoreResult<Self> {
        let table = backend.load()?;
        debug!(location = %backend.location(), rows = table.len(), "Inventory repository opened");
        Ok(InventoryRepository {
            backend,
            table,
            stale: false,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current snapshot.
    pub fn table(&self) -> &InventoryTable {
        &self.table
    }

    /// True after a failed save, until the next reload.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Replaces the snapshot with what the backend holds now.
    pub fn reload(&mut self) -> StoreResult<&InventoryTable> {
        self.table = self.backend.load()?;
        self.stale = false;
        debug!(rows = self.table.len(), "Inventory reloaded");
        Ok(&self.table)
    }

    /// Writes the snapshot as it is.
    pub fn persist(&mut self) -> StoreResult<()> {
        match self.backend.save(&self.table) {
            Ok(()) => {
                self.stale = false;
                Ok(())
            }
            Err(e) => {
                self.stale = true;
                Err(e)
            }
        }
    }

    /// Add/update from a validated form.
    ///
    /// ## Errors
    /// - [`CoreError::NegativeQuantity`](tally_core::CoreError::NegativeQuantity)
    ///   wrapped as `StoreError::Domain`
    /// - any backend error from the save
    pub fn upsert(&mut self, form: &ItemForm) -> StoreResult<UpsertOutcome> {
        let outcome = self.mutate(|table| table.apply(form).map_err(Into::into))?;
        info!(
            barcode = %form.barcode(),
            quantity = form.quantity(),
            price = %form.price(),
            outcome = ?outcome,
            "Inventory item saved"
        );
        Ok(outcome)
    }

    /// Removes every row with `barcode` and persists, even when nothing
    /// matched.
    pub fn delete(&mut self, barcode: &str) -> StoreResult<usize> {
        let removed = self.mutate(|table| Ok(table.delete(barcode)))?;
        if removed == 0 {
            warn!(barcode = %barcode, "Delete matched no rows");
        } else {
            info!(barcode = %barcode, removed, "Inventory item deleted");
        }
        Ok(removed)
    }

    /// Decrements stock for sold lines and persists.
    pub fn apply_sale(
        &mut self,
        lines: &[CartLine],
        missing: MissingItemPolicy,
    ) -> StoreResult<Vec<StockChange>> {
        let changes = self.mutate(|table| table.deduct(lines, missing).map_err(Into::into))?;
        info!(lines = lines.len(), rows_changed = changes.len(), "Stock decremented");
        Ok(changes)
    }

    /// Filtered copy of the snapshot.
    pub fn search(&self, query: &str) -> InventoryTable {
        self.table.search(query)
    }

    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut InventoryTable) -> StoreResult<T>,
    ) -> StoreResult<T> {
        if self.stale {
            warn!("Inventory snapshot is stale, reloading before mutation");
            self.reload()?;
        }

        let mut next = self.table.clone();
        let result = change(&mut next)?;

        if let Err(e) = self.backend.save(&next) {
            self.stale = true;
            return Err(e);
        }

        self.table = next;
        Ok(result)
    }
}
