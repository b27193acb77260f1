//! End-to-end billing against a real inventory file and archive.

use std::fs;
use std::path::Path;

use tally_core::{CoreError, ItemForm, Money};
use tally_store::{
    backup_file, export_inventory_csv, ArchiveConfig, BillingEngine, BillingError, BillingPolicy,
    BillsArchive, CsvInventoryFile, InventoryBackend, InventoryRepository,
};
use tempfile::TempDir;

fn seed_inventory(path: &Path) {
    let mut repo = InventoryRepository::open(CsvInventoryFile::new(path)).unwrap();
    repo.upsert(&ItemForm::new("B1", "Rice 1kg", 10, Money::from_cents(1000)).unwrap())
        .unwrap();
    repo.upsert(&ItemForm::new("B2", "Salt", 5, Money::from_cents(500)).unwrap())
        .unwrap();
}

async fn open_engine(dir: &TempDir) -> BillingEngine<CsvInventoryFile> {
    let inventory = dir.path().join("inventory.csv");
    let repo = InventoryRepository::open(CsvInventoryFile::new(&inventory)).unwrap();
    let archive = BillsArchive::open(ArchiveConfig::new(dir.path().join("bills.sqlite")))
        .await
        .unwrap();
    BillingEngine::new(repo, archive, BillingPolicy::default())
}

#[tokio::test]
async fn test_finalize_writes_archive_and_decrements_file() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = dir.path().join("inventory.csv");
    seed_inventory(&inventory);

    let mut engine = open_engine(&dir).await;
    engine.add_item("B1", 2).unwrap();
    engine.add_item("B2", 1).unwrap();

    let untaxed = engine.totals(false);
    assert_eq!(
        (untaxed.subtotal.cents(), untaxed.tax.cents(), untaxed.grand_total.cents()),
        (2500, 0, 2500)
    );

    let generated = engine.generate_bill(true).await.unwrap();
    assert_eq!(generated.bill.totals.subtotal.cents(), 2500);
    assert_eq!(generated.bill.totals.tax.cents(), 450);
    assert_eq!(generated.bill.totals.grand_total.cents(), 2950);
    assert!(engine.cart().is_empty());

    let stock = CsvInventoryFile::new(&inventory).load().unwrap();
    assert_eq!(stock.find("B1").unwrap().quantity, 8);
    assert_eq!(stock.find("B2").unwrap().quantity, 4);

    let sheet = engine
        .archive()
        .read_sheet(&generated.sheet_name)
        .await
        .unwrap();
    let labels: Vec<&str> = sheet.rows.iter().map(|r| r.unit_price.as_str()).collect();
    assert_eq!(labels, vec!["10.00", "5.00", "Subtotal", "GST (18%)", "Grand Total"]);
    assert_eq!(sheet.rows[4].total, "29.50");
    assert_eq!(sheet.cells[0].label, "Bill ID:");
    assert_eq!(sheet.cells[0].value, generated.bill.id.as_str());
}

#[tokio::test]
async fn test_unknown_barcode_leaves_cart_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    seed_inventory(&dir.path().join("inventory.csv"));

    let mut engine = open_engine(&dir).await;
    engine.add_item("B1", 1).unwrap();

    let err = engine.add_item("NOPE", 1).unwrap_err();
    assert!(matches!(err, BillingError::Domain(CoreError::NotFound { .. })));
    assert_eq!(engine.cart().len(), 1);
}

#[tokio::test]
async fn test_bills_accumulate_as_separate_sheets() {
    let dir = tempfile::tempdir().unwrap();
    seed_inventory(&dir.path().join("inventory.csv"));

    let mut engine = open_engine(&dir).await;
    engine.add_item("B1", 1).unwrap();
    let first = engine.generate_bill(false).await.unwrap();
    engine.add_item("B1", 1).unwrap();
    let second = engine.generate_bill(true).await.unwrap();

    assert_ne!(first.bill.id, second.bill.id);
    let sheets = engine.archive().list_sheets().await.unwrap();
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].name, first.sheet_name);
    assert_eq!(sheets[1].name, second.sheet_name);
}

#[tokio::test]
async fn test_manager_edit_between_adds_is_seen() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = dir.path().join("inventory.csv");
    seed_inventory(&inventory);

    let mut engine = open_engine(&dir).await;
    engine.add_item("B2", 2).unwrap();

    // The inventory manager sells off most of the salt meanwhile.
    let mut manager = InventoryRepository::open(CsvInventoryFile::new(&inventory)).unwrap();
    let mut table = manager.table().clone();
    table.adjust_quantity("B2", -4).unwrap();
    CsvInventoryFile::new(&inventory).save(&table).unwrap();
    manager.reload().unwrap();

    let err = engine.add_item("B2", 1).unwrap_err();
    assert!(matches!(
        err,
        BillingError::Domain(CoreError::InsufficientStock { .. })
    ));

    let err = engine.generate_bill(false).await.unwrap_err();
    assert!(matches!(
        err,
        BillingError::Domain(CoreError::InsufficientStock { available: 1, requested: 2, .. })
    ));
    assert_eq!(engine.archive().sheet_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_export_and_backup() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = dir.path().join("inventory.csv");
    seed_inventory(&inventory);

    let mut engine = open_engine(&dir).await;
    engine.add_item("B1", 2).unwrap();

    let bill_csv = dir.path().join("exports/bill.csv");
    assert_eq!(engine.export_cart_csv(&bill_csv, true).unwrap(), 4);
    let text = fs::read_to_string(&bill_csv).unwrap();
    assert!(text.contains(",,,GST (18%),3.60"));

    let repo = InventoryRepository::open(CsvInventoryFile::new(&inventory)).unwrap();
    let filtered = repo.search("rice");
    let inv_csv = dir.path().join("exports/rice.csv");
    assert_eq!(export_inventory_csv(&filtered, &inv_csv).unwrap(), 1);

    let copy = dir.path().join("backup/inventory.csv");
    backup_file(&inventory, &copy).unwrap();
    assert_eq!(fs::read(&inventory).unwrap(), fs::read(&copy).unwrap());
}
