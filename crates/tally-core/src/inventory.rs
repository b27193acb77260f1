//! # Inventory Table
//!
//! The in-memory inventory: an ordered list of [`InventoryItem`] rows keyed
//! by barcode. Loading and saving live in `tally-store`; this module only
//! holds the mutation rules.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  upsert(barcode, name, qty, price)                                      │
//! │    barcode present?  ── yes ──► quantity += qty, price = price          │
//! │          │                       (name kept, negative result rejected)  │
//! │          no                                                             │
//! │          ▼                                                              │
//! │    append new row                                                       │
//! │                                                                         │
//! │  deduct(lines)                                                          │
//! │    aggregate per barcode ──► check every row ──► apply all or nothing   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows keep insertion order. Searching returns a filtered copy in the same
//! order.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartLine, InventoryItem};
use crate::validation::ItemForm;

// =============================================================================
// Outcome Types
// =============================================================================

/// What an upsert did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    /// A new row was appended.
    Inserted,
    /// An existing row had its quantity and price changed.
    Updated,
}

/// How [`InventoryTable::deduct`] treats a cart barcode that is no longer in
/// the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingItemPolicy {
    /// Fail with [`CoreError::NotFound`].
    #[default]
    Reject,
    /// Leave it out of the deduction.
    Skip,
}

/// One applied stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChange {
    pub barcode: String,
    pub before: i64,
    pub after: i64,
}

// =============================================================================
// Inventory Table
// =============================================================================

/// Ordered inventory rows with at most one row per barcode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTable {
    items: Vec<InventoryItem>,
}

impl InventoryTable {
    pub fn new() -> Self {
        InventoryTable { items: Vec::new() }
    }

    /// Builds a table from rows read off disk.
    ///
    /// ## Errors
    /// See [`merge_row`](Self::merge_row).
    pub fn from_items(items: impl IntoIterator<Item = InventoryItem>) -> CoreResult<Self> {
        let mut table = InventoryTable::new();
        for item in items {
            table.merge_row(item)?;
        }
        Ok(table)
    }

    /// Adds one row read off disk.
    ///
    /// A duplicate barcode is folded into the first row the same way an
    /// upsert would fold it (quantity summed, later price wins), so the
    /// one-row-per-barcode invariant holds even for a hand-edited file.
    ///
    /// ## Errors
    /// [`CoreError::NegativeQuantity`] for a negative quantity and
    /// [`ValidationError::OutOfRange`] when the summed quantity does not fit.
    /// The table is unchanged in both cases.
    pub fn merge_row(&mut self, item: InventoryItem) -> CoreResult<()> {
        match self.position(&item.barcode) {
            Some(idx) => {
                let existing = &mut self.items[idx];
                existing.quantity = checked_stock(&item.barcode, existing.quantity, item.quantity)?;
                existing.price = item.price;
            }
            None => {
                checked_stock(&item.barcode, 0, item.quantity)?;
                self.items.push(item);
            }
        }
        Ok(())
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Looks up a row by exact barcode.
    pub fn find(&self, barcode: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.barcode == barcode)
    }

    fn position(&self, barcode: &str) -> Option<usize> {
        self.items.iter().position(|item| item.barcode == barcode)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` to an existing row and replaces its price, or appends
    /// a new row.
    ///
    /// ## Errors
    /// [`CoreError::NegativeQuantity`] when the resulting stock would drop
    /// below zero. The table is unchanged in that case.
    pub fn upsert(
        &mut self,
        barcode: &str,
        name: &str,
        quantity: i64,
        price: Money,
    ) -> CoreResult<UpsertOutcome> {
        match self.position(barcode) {
            Some(idx) => {
                let item = &mut self.items[idx];
                let updated = checked_stock(barcode, item.quantity, quantity)?;
                item.quantity = updated;
                item.price = price;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let initial = checked_stock(barcode, 0, quantity)?;
                self.items.push(InventoryItem {
                    barcode: barcode.to_string(),
                    name: name.to_string(),
                    quantity: initial,
                    price,
                });
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Upsert driven by a validated form.
    pub fn apply(&mut self, form: &ItemForm) -> CoreResult<UpsertOutcome> {
        self.upsert(form.barcode(), form.name(), form.quantity(), form.price())
    }

    /// Removes every row with this barcode and returns how many went.
    pub fn delete(&mut self, barcode: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|item| item.barcode != barcode);
        before - self.items.len()
    }

    /// Changes the stock of one row by `delta`.
    pub fn adjust_quantity(&mut self, barcode: &str, delta: i64) -> CoreResult<StockChange> {
        let idx = self
            .position(barcode)
            .ok_or_else(|| CoreError::not_found(barcode))?;
        let item = &mut self.items[idx];
        let before = item.quantity;
        item.quantity = checked_stock(barcode, before, delta)?;

        Ok(StockChange {
            barcode: barcode.to_string(),
            before,
            after: item.quantity,
        })
    }

    /// Case-insensitive substring filter on barcode or name.
    ///
    /// The query is matched as given, surrounding spaces included; callers
    /// reading user input trim it first with
    /// [`validate_search_query`](crate::validation::validate_search_query).
    /// An empty query returns the whole table.
    pub fn search(&self, query: &str) -> InventoryTable {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }

        InventoryTable {
            items: self
                .items
                .iter()
                .filter(|item| item.matches(&needle))
                .cloned()
                .collect(),
        }
    }

    /// Decrements stock for every cart line.
    ///
    /// Lines sharing a barcode are summed first. Every row is checked before
    /// any is changed, so on error the table is untouched.
    ///
    /// ## Errors
    /// - [`CoreError::NotFound`] for a missing barcode under
    ///   [`MissingItemPolicy::Reject`]
    /// - [`CoreError::InsufficientStock`] when a row holds less than the
    ///   billed total
    pub fn deduct(
        &mut self,
        lines: &[CartLine],
        missing: MissingItemPolicy,
    ) -> CoreResult<Vec<StockChange>> {
        let mut demand: Vec<(&str, i64)> = Vec::new();
        for line in lines {
            match demand.iter_mut().find(|(barcode, _)| *barcode == line.barcode) {
                Some((_, qty)) => *qty += line.quantity,
                None => demand.push((line.barcode.as_str(), line.quantity)),
            }
        }

        let mut plan = Vec::with_capacity(demand.len());
        for (barcode, requested) in demand {
            let idx = match self.position(barcode) {
                Some(idx) => idx,
                None => match missing {
                    MissingItemPolicy::Reject => return Err(CoreError::not_found(barcode)),
                    MissingItemPolicy::Skip => continue,
                },
            };

            let available = self.items[idx].quantity;
            if requested > available {
                return Err(CoreError::InsufficientStock {
                    barcode: barcode.to_string(),
                    available,
                    requested,
                });
            }
            plan.push((idx, requested));
        }

        Ok(plan
            .into_iter()
            .map(|(idx, requested)| {
                let item = &mut self.items[idx];
                let before = item.quantity;
                item.quantity -= requested;
                StockChange {
                    barcode: item.barcode.clone(),
                    before,
                    after: item.quantity,
                }
            })
            .collect())
    }
}

impl IntoIterator for InventoryTable {
    type Item = InventoryItem;
    type IntoIter = std::vec::IntoIter<InventoryItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

fn checked_stock(barcode: &str, current: i64, delta: i64) -> CoreResult<i64> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        None if delta > 0 => Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into()),
        _ => Err(CoreError::NegativeQuantity {
            barcode: barcode.to_string(),
            current,
            delta,
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked() -> InventoryTable {
        let mut table = InventoryTable::new();
        table.upsert("B1", "Rice 1kg", 10, Money::from_cents(1000)).unwrap();
        table.upsert("B2", "Sea Salt", 4, Money::from_cents(500)).unwrap();
        table.upsert("C3", "Brown Rice", 7, Money::from_cents(1500)).unwrap();
        table
    }

    fn line(barcode: &str, quantity: i64) -> CartLine {
        CartLine {
            barcode: barcode.to_string(),
            name: barcode.to_string(),
            quantity,
            unit_price: Money::from_cents(100),
        }
    }

    #[test]
    fn test_upsert_accumulates_and_replaces_price() {
        let mut table = InventoryTable::new();
        assert_eq!(
            table.upsert("B1", "Rice", 3, Money::from_cents(1000)).unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            table.upsert("B1", "Rice Premium", 5, Money::from_cents(1200)).unwrap(),
            UpsertOutcome::Updated
        );

        assert_eq!(table.len(), 1);
        let item = table.find("B1").unwrap();
        assert_eq!(item.quantity, 8);
        assert_eq!(item.price.cents(), 1200);
        assert_eq!(item.name, "Rice");
    }

    #[test]
    fn test_upserts_keep_one_row_per_barcode() {
        let mut table = InventoryTable::new();
        for (i, barcode) in ["A", "B", "A", "C", "B", "A"].iter().enumerate() {
            table
                .upsert(barcode, "Item", 1, Money::from_cents(100 + i as i64))
                .unwrap();
        }

        assert_eq!(table.len(), 3);
        assert_eq!(table.find("A").unwrap().quantity, 3);
        assert_eq!(table.find("A").unwrap().price.cents(), 105);
    }

    #[test]
    fn test_negative_upsert_rejected_and_table_unchanged() {
        let mut table = stocked();
        let before = table.clone();

        let err = table.upsert("B2", "Sea Salt", -5, Money::from_cents(1)).unwrap_err();
        assert_eq!(
            err,
            CoreError::NegativeQuantity {
                barcode: "B2".to_string(),
                current: 4,
                delta: -5,
            }
        );
        assert_eq!(table, before);

        assert!(table.upsert("NEW", "New", -1, Money::from_cents(1)).is_err());
        assert_eq!(table, before);
    }

    #[test]
    fn test_delete_removes_all_matches() {
        let mut table = InventoryTable::from_items(vec![
            InventoryItem {
                barcode: "B1".to_string(),
                name: "Rice".to_string(),
                quantity: 1,
                price: Money::from_cents(100),
            },
            InventoryItem {
                barcode: "B1".to_string(),
                name: "Rice again".to_string(),
                quantity: 2,
                price: Money::from_cents(150),
            },
        ])
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.find("B1").unwrap().quantity, 3);
        assert_eq!(table.find("B1").unwrap().price.cents(), 150);

        assert_eq!(table.delete("B1"), 1);
        assert!(table.is_empty());
        assert_eq!(table.delete("B1"), 0);
    }

    #[test]
    fn test_merge_row_rejects_overflowing_quantity() {
        let row = |quantity| InventoryItem {
            barcode: "B1".to_string(),
            name: "Rice".to_string(),
            quantity,
            price: Money::from_cents(100),
        };
        let mut table = InventoryTable::new();
        table.merge_row(row(i64::MAX)).unwrap();

        let err = table.merge_row(row(1)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert_eq!(table.find("B1").unwrap().quantity, i64::MAX);

        assert!(InventoryTable::from_items(vec![row(i64::MAX), row(i64::MAX)]).is_err());
        assert!(matches!(
            InventoryTable::new().merge_row(row(-1)),
            Err(CoreError::NegativeQuantity { .. })
        ));
    }

    #[test]
    fn test_search() {
        let table = stocked();

        assert_eq!(table.search(""), table);
        assert!(table.search("   ").is_empty());
        assert!(table.search("salt ").is_empty());
        assert_eq!(table.search("salt").len(), 1);
        let spaced: Vec<_> = table.search("sea salt").iter().map(|i| i.barcode.clone()).collect();
        assert_eq!(spaced, vec!["B2"]);

        let rice: Vec<_> = table.search("RICE").iter().map(|i| i.barcode.clone()).collect();
        assert_eq!(rice, vec!["B1", "C3"]);

        let by_barcode = table.search("c3");
        assert_eq!(by_barcode.len(), 1);
        assert_eq!(by_barcode.items()[0].name, "Brown Rice");

        assert!(table.search("sugar").is_empty());
    }

    #[test]
    fn test_adjust_quantity() {
        let mut table = stocked();
        let change = table.adjust_quantity("B1", -4).unwrap();
        assert_eq!((change.before, change.after), (10, 6));

        assert!(matches!(
            table.adjust_quantity("B1", -7),
            Err(CoreError::NegativeQuantity { .. })
        ));
        assert!(matches!(
            table.adjust_quantity("ZZ", 1),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_deduct_aggregates_lines() {
        let mut table = stocked();
        let changes = table
            .deduct(&[line("B1", 2), line("B2", 1), line("B1", 3)], MissingItemPolicy::Reject)
            .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(table.find("B1").unwrap().quantity, 5);
        assert_eq!(table.find("B2").unwrap().quantity, 3);
        assert_eq!(table.find("C3").unwrap().quantity, 7);
    }

    #[test]
    fn test_deduct_is_all_or_nothing() {
        let mut table = stocked();
        let before = table.clone();

        let err = table
            .deduct(&[line("B1", 2), line("B2", 3), line("B2", 2)], MissingItemPolicy::Reject)
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                barcode: "B2".to_string(),
                available: 4,
                requested: 5,
            }
        );
        assert_eq!(table, before);
    }

    #[test]
    fn test_deduct_missing_item_policy() {
        let mut table = stocked();
        let lines = [line("B1", 1), line("GONE", 1)];

        assert_eq!(
            table.deduct(&lines, MissingItemPolicy::Reject).unwrap_err(),
            CoreError::not_found("GONE")
        );
        assert_eq!(table.find("B1").unwrap().quantity, 10);

        let changes = table.deduct(&lines, MissingItemPolicy::Skip).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(table.find("B1").unwrap().quantity, 9);
    }

    #[test]
    fn test_apply_form() {
        let mut table = InventoryTable::new();
        let form = ItemForm::new("B9", "Tea", 12, Money::from_cents(25000)).unwrap();
        assert_eq!(table.apply(&form).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(table.find("B9").unwrap().quantity, 12);
    }
}
