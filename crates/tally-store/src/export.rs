//! CSV export and file backup.

use std::fs;
use std::path::Path;

use tally_core::{BillRow, InventoryTable, BILL_COLUMNS};
use tracing::info;

use crate::backend::{parent_dir, INVENTORY_COLUMNS};
use crate::error::{StoreError, StoreResult};

/// Writes a header row followed by `rows`, creating parent directories.
pub fn write_csv<R, I, S>(path: &Path, headers: &[&str], rows: R) -> StoreResult<usize>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let dir = parent_dir(path);
    fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

    let mut writer = csv::Writer::from_path(path).map_err(|e| StoreError::csv(path, e))?;
    writer
        .write_record(headers)
        .map_err(|e| StoreError::csv(path, e))?;

    let mut written = 0;
    for row in rows {
        writer.write_record(row).map_err(|e| StoreError::csv(path, e))?;
        written += 1;
    }
    writer.flush().map_err(|e| StoreError::io(path, e))?;

    Ok(written)
}

/// Exports the given (possibly filtered) table with the inventory columns.
pub fn export_inventory_csv(table: &InventoryTable, path: &Path) -> StoreResult<usize> {
    let rows = table.iter().map(|item| {
        [
            item.barcode.clone(),
            item.name.clone(),
            item.quantity.to_string(),
            item.price.to_string(),
        ]
    });
    let written = write_csv(path, &INVENTORY_COLUMNS, rows)?;
    info!(path = %path.display(), rows = written, "Inventory exported");
    Ok(written)
}

/// Exports bill-layout rows (items plus summary rows).
pub fn export_bill_csv(rows: &[BillRow], path: &Path) -> StoreResult<usize> {
    let written = write_csv(path, &BILL_COLUMNS, rows.iter().map(BillRow::cells))?;
    info!(path = %path.display(), rows = written, "Bill exported");
    Ok(written)
}

/// Copies `source` byte for byte to `destination` and returns the bytes
/// copied.
pub fn backup_file(source: &Path, destination: &Path) -> StoreResult<u64> {
    if !source.is_file() {
        return Err(StoreError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::NotFound, "nothing to back up"),
        ));
    }

    let dir = parent_dir(destination);
    fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

    let bytes = fs::copy(source, destination).map_err(|e| StoreError::io(destination, e))?;
    info!(
        source = %source.display(),
        destination = %destination.display(),
        bytes,
        "Backup written"
    );
    Ok(bytes)
}
