//! # Inventory Backends
//!
//! Where the inventory table lives between operations.
//!
//! ## Backends
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     InventoryBackend (trait)                            │
//! │                                                                         │
//! │   load() ──► InventoryTable          save(&InventoryTable)             │
//! │                                                                         │
//! │   ┌───────────────────────────┐     ┌───────────────────────────┐      │
//! │   │     CsvInventoryFile      │     │      MemoryBackend        │      │
//! │   │  Barcode,Name,Quantity,   │     │  Arc<Mutex<table>>        │      │
//! │   │  Price  (header row)      │     │  switchable save failure  │      │
//! │   │  temp file + rename       │     │  (tests)                  │      │
//! │   └───────────────────────────┘     └───────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## File Format
//! Header names are matched case-insensitively after trimming and may come in
//! any order. Extra columns are ignored on load and dropped on save. Saves
//! always write the canonical header in canonical order.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tally_core::validation::validate_barcode;
use tally_core::{InventoryItem, InventoryTable, Money, MAX_PRICE_CENTS};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Canonical inventory columns, in file order.
pub const INVENTORY_COLUMNS: [&str; 4] = ["Barcode", "Name", "Quantity", "Price"];

// =============================================================================
// Trait
// =============================================================================

/// Load/save access to the persisted inventory table.
pub trait InventoryBackend: Send + Sync {
    /// Reads the whole table.
    fn load(&self) -> StoreResult<InventoryTable>;

    /// Replaces the whole persisted table.
    fn save(&self, table: &InventoryTable) -> StoreResult<()>;

    /// Human-readable location for logs and messages.
    fn location(&self) -> String;
}

// =============================================================================
// CSV File Backend
// =============================================================================

/// Inventory stored as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvInventoryFile {
    path: PathBuf,
}

/// One inventory row in canonical column order.
#[derive(Debug, Serialize)]
pub(crate) struct InventoryRecord<'a> {
    #[serde(rename = "Barcode")]
    barcode: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Quantity")]
    quantity: i64,
    #[serde(rename = "Price")]
    price: String,
}

impl<'a> From<&'a InventoryItem> for InventoryRecord<'a> {
    fn from(item: &'a InventoryItem) -> Self {
        InventoryRecord {
            barcode: &item.barcode,
            name: &item.name,
            quantity: item.quantity,
            price: item.price.to_string(),
        }
    }
}

impl CsvInventoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvInventoryFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self, file: fs::File) -> StoreResult<InventoryTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| StoreError::csv(&self.path, e))?
            .clone();
        let columns = ColumnMap::resolve(&headers).map_err(|missing| StoreError::Schema {
            path: self.path.clone(),
            missing,
        })?;

        let mut table = InventoryTable::new();
        for record in reader.records() {
            let record = record.map_err(|e| StoreError::csv(&self.path, e))?;
            let line = record.position().map_or(0, |p| p.line());
            let invalid = |reason: String| StoreError::InvalidRow {
                path: self.path.clone(),
                line,
                reason,
            };
            let item = columns.parse(&record).map_err(invalid)?;
            table.merge_row(item).map_err(|e| invalid(e.to_string()))?;
        }

        Ok(table)
    }
}

impl InventoryBackend for CsvInventoryFile {
    /// Reads the inventory file.
    ///
    /// A missing or unreadable file yields an empty table; only a file that
    /// opens but is malformed is an error.
    fn load(&self) -> StoreResult<InventoryTable> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Inventory file not found, starting empty");
                return Ok(InventoryTable::new());
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Inventory file unreadable, starting empty"
                );
                return Ok(InventoryTable::new());
            }
        };

        let table = self.read_table(file)?;
        debug!(path = %self.path.display(), rows = table.len(), "Inventory loaded");
        Ok(table)
    }

    /// Writes the table to a temp file beside the target and renames it
    /// into place.
    fn save(&self, table: &InventoryTable) -> StoreResult<()> {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        {
            let mut writer = csv::Writer::from_writer(&mut tmp);
            // An empty table still gets its header row.
            if table.is_empty() {
                writer
                    .write_record(INVENTORY_COLUMNS)
                    .map_err(|e| StoreError::csv(&self.path, e))?;
            }
            for item in table.iter() {
                writer
                    .serialize(InventoryRecord::from(item))
                    .map_err(|e| StoreError::csv(&self.path, e))?;
            }
            writer.flush().map_err(|e| StoreError::io(&self.path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;

        debug!(path = %self.path.display(), rows = table.len(), "Inventory saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Directory a file lives in; `.` for bare file names.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

// =============================================================================
// Column Mapping
// =============================================================================

/// Positions of the canonical columns within a file's header row.
struct ColumnMap {
    barcode: usize,
    name: usize,
    quantity: usize,
    price: usize,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, Vec<String>> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };
        let positions: Vec<Option<usize>> = INVENTORY_COLUMNS.iter().map(|&c| find(c)).collect();

        match positions[..] {
            [Some(barcode), Some(name), Some(quantity), Some(price)] => Ok(ColumnMap {
                barcode,
                name,
                quantity,
                price,
            }),
            _ => Err(INVENTORY_COLUMNS
                .iter()
                .zip(&positions)
                .filter(|(_, pos)| pos.is_none())
                .map(|(name, _)| name.to_string())
                .collect()),
        }
    }

    fn parse(&self, record: &csv::StringRecord) -> Result<InventoryItem, String> {
        let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

        let barcode = cell(self.barcode);
        if barcode.is_empty() {
            return Err("barcode is empty".to_string());
        }
        validate_barcode(barcode).map_err(|e| e.to_string())?;

        let quantity = parse_quantity(cell(self.quantity))
            .ok_or_else(|| format!("quantity '{}' is not a whole number ≥ 0", cell(self.quantity)))?;

        let price: Money = cell(self.price)
            .parse()
            .map_err(|_| format!("price '{}' is not a decimal amount", cell(self.price)))?;
        if price.is_negative() {
            return Err(format!("price '{}' is negative", cell(self.price)));
        }
        if price.cents() > MAX_PRICE_CENTS {
            return Err(format!("price '{}' is above the maximum", cell(self.price)));
        }

        Ok(InventoryItem {
            barcode: barcode.to_string(),
            name: cell(self.name).to_string(),
            quantity,
            price,
        })
    }
}

/// Whole, non-negative quantity. Spreadsheet tools sometimes write `12.0`,
/// which is accepted.
fn parse_quantity(raw: &str) -> Option<i64> {
    let whole = match raw.split_once('.') {
        Some((whole, frac)) if frac.bytes().all(|b| b == b'0') => whole,
        Some(_) => return None,
        None => raw,
    };
    whole.parse::<i64>().ok().filter(|q| *q >= 0)
}

// =============================================================================
// In-Memory Backend
// =============================================================================

/// Shared in-memory inventory for tests and demos.
///
/// Clones share the same table, so a test can keep one handle to inspect
/// or edit the "file" while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    table: Arc<Mutex<InventoryTable>>,
    fail_saves: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new(table: InventoryTable) -> Self {
        MemoryBackend {
            table: Arc::new(Mutex::new(table)),
            ..Default::default()
        }
    }

    /// Makes every following `save` fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Replaces the stored table, as another writer would.
    pub fn replace(&self, table: InventoryTable) -> StoreResult<()> {
        *self.lock()? = table;
        Ok(())
    }

    /// Current stored table.
    pub fn snapshot(&self) -> StoreResult<InventoryTable> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, InventoryTable>> {
        self.table
            .lock()
            .map_err(|_| StoreError::Internal("memory backend lock poisoned".to_string()))
    }
}

impl InventoryBackend for MemoryBackend {
    fn load(&self) -> StoreResult<InventoryTable> {
        self.snapshot()
    }

    fn save(&self, table: &InventoryTable) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                "memory",
                std::io::Error::new(ErrorKind::PermissionDenied, "save disabled"),
            ));
        }
        *self.lock()? = table.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// Writes raw text to a file, creating parent directories.
#[cfg(test)]
pub(crate) fn write_fixture(path: &Path, text: &str) {
    use std::io::Write;

    let dir = parent_dir(path);
    fs::create_dir_all(dir).unwrap();
    let mut file = fs::File::create(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> InventoryTable {
        let mut table = InventoryTable::new();
        table.upsert("8901", "Rice, Basmati", 10, Money::from_cents(1050)).unwrap();
        table.upsert("8902", "Salt \"Iodized\"", 0, Money::from_cents(500)).unwrap();
        table
    }

    #[test]
    fn test_missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvInventoryFile::new(dir.path().join("nope.csv"));
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvInventoryFile::new(dir.path().join("data/inventory.csv"));

        let table = sample_table();
        backend.save(&table).unwrap();
        assert_eq!(backend.load().unwrap(), table);

        let text = fs::read_to_string(backend.path()).unwrap();
        assert!(text.starts_with("Barcode,Name,Quantity,Price\n"));
        assert!(text.contains("8901,\"Rice, Basmati\",10,10.50"));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let backend = CsvInventoryFile::new(dir.path().join("inventory.csv"));
        backend.save(&InventoryTable::new()).unwrap();

        let text = fs::read_to_string(backend.path()).unwrap();
        assert_eq!(text.trim_end(), "Barcode,Name,Quantity,Price");
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn test_headers_case_insensitive_any_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        write_fixture(
            &path,
            " price ,QUANTITY,Supplier,barcode,name\n12.5,3.0,Acme,B1,Soap\n",
        );

        let table = CsvInventoryFile::new(&path).load().unwrap();
        let item = table.find("B1").unwrap();
        assert_eq!(item.name, "Soap");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.price.cents(), 1250);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        write_fixture(&path, "Barcode,Name\nB1,Soap\n");

        match CsvInventoryFile::new(&path).load() {
            Err(StoreError::Schema { missing, .. }) => {
                assert_eq!(missing, vec!["Quantity".to_string(), "Price".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_row_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        write_fixture(&path, "Barcode,Name,Quantity,Price\nB1,Soap,2,1.00\nB2,Tea,two,3.00\n");

        match CsvInventoryFile::new(&path).load() {
            Err(StoreError::InvalidRow { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("two"));
            }
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_barcode_with_space_is_invalid_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        write_fixture(&path, "Barcode,Name,Quantity,Price\nAB 12,Soap,2,1.00\n");

        match CsvInventoryFile::new(&path).load() {
            Err(StoreError::InvalidRow { line, reason, .. }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("barcode"));
            }
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_overflowing_rows_are_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.csv");
        let max = i64::MAX;
        write_fixture(
            &path,
            &format!("Barcode,Name,Quantity,Price\nB1,Soap,{max},1.00\nB1,Soap,1,1.00\n"),
        );
        match CsvInventoryFile::new(&path).load() {
            Err(StoreError::InvalidRow { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected invalid row, got {:?}", other),
        }

        write_fixture(&path, "Barcode,Name,Quantity,Price\nB1,Soap,1,99999999999999.00\n");
        match CsvInventoryFile::new(&path).load() {
            Err(StoreError::InvalidRow { reason, .. }) => assert!(reason.contains("maximum")),
            other => panic!("expected invalid row, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("12"), Some(12));
        assert_eq!(parse_quantity("12.00"), Some(12));
        assert_eq!(parse_quantity("12.5"), None);
        assert_eq!(parse_quantity("-1"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_memory_backend_save_failure() {
        let backend = MemoryBackend::new(sample_table());
        backend.set_fail_saves(true);
        assert!(matches!(
            backend.save(&InventoryTable::new()),
            Err(StoreError::Io { .. })
        ));
        assert_eq!(backend.load().unwrap().len(), 2);

        backend.set_fail_saves(false);
        backend.save(&InventoryTable::new()).unwrap();
        assert!(backend.load().unwrap().is_empty());
        assert_eq!(backend.save_count(), 1);
    }
}
