//! # Bills Archive
//!
//! Append-only store of finalized bills, one sheet per bill, kept in a
//! single SQLite file.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        bills archive (SQLite)                           │
//! │                                                                         │
//! │  sheets        name = "Bill_20240309_140507_a1b2c3", bill_id, totals   │
//! │    │                                                                    │
//! │    ├── sheet_rows   Barcode | Name | Qty | Unit Price | Total          │
//! │    │                8901    | Rice | 2   | 10.00      | 20.00          │
//! │    │                        |      |     | Subtotal   | 20.00          │
//! │    │                        |      |     | GST (18%)  | 3.60           │
//! │    │                        |      |     | Grand Total| 23.60          │
//! │    │                                                                    │
//! │    └── sheet_cells  Bill ID: … | Date: 2024-03-09 | Time: 14:05:07     │
//! │                                                                         │
//! │  Triggers reject every UPDATE and DELETE.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Journal Mode
//! The archive uses the rollback journal (DELETE mode) rather than WAL so a
//! committed archive is always a single self-contained file, which is what
//! the byte-copy backup expects.

use chrono::{DateTime, FixedOffset};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tally_core::{Bill, BillRow, Money};
use tracing::{debug, info};

use crate::backend::parent_dir;
use crate::error::{StoreError, StoreResult};
use crate::migrations;

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Archive connection settings.
///
/// ## Example
/// ```rust,ignore
/// let config = ArchiveConfig::new("/path/to/bills.sqlite")
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Path to the archive file. Created when missing.
    pub path: PathBuf,

    /// How long a write waits on a lock held by another process.
    /// Default: 2 seconds
    pub busy_timeout: Duration,

    /// Connection timeout.
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Whether to run migrations on open.
    /// Default: true
    pub run_migrations: bool,
}

impl ArchiveConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ArchiveConfig {
            path: path.into(),
            busy_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
            run_migrations: true,
        }
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// In-memory archive for tests.
    pub fn in_memory() -> Self {
        ArchiveConfig {
            path: PathBuf::from(MEMORY_PATH),
            busy_timeout: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

// =============================================================================
// Records
// =============================================================================

/// One archived bill as listed by [`BillsArchive::list_sheets`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SheetSummary {
    pub name: String,
    pub bill_id: String,
    pub created_at: DateTime<FixedOffset>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
}

impl SheetSummary {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SheetRowRecord {
    barcode: String,
    name: String,
    qty: String,
    unit_price: String,
    total: String,
}

impl From<SheetRowRecord> for BillRow {
    fn from(r: SheetRowRecord) -> Self {
        BillRow {
            barcode: r.barcode,
            name: r.name,
            qty: r.qty,
            unit_price: r.unit_price,
            total: r.total,
        }
    }
}

/// A labelled metadata cell ("Date:" → "2024-03-09").
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SheetCell {
    pub label: String,
    pub value: String,
}

/// A full sheet read back from the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedSheet {
    pub summary: SheetSummary,
    pub rows: Vec<BillRow>,
    pub cells: Vec<SheetCell>,
}

// =============================================================================
// Archive
// =============================================================================

/// Handle to the bills archive.
#[derive(Debug, Clone)]
pub struct BillsArchive {
    pool: SqlitePool,
    path: PathBuf,
}

impl BillsArchive {
    /// Opens (or creates) the archive and applies migrations.
    ///
    /// ## Errors
    /// [`StoreError::Persistence`] when the file cannot be opened or is not
    /// an archive; [`StoreError::Migration`] when the schema cannot be
    /// applied.
    pub async fn open(config: ArchiveConfig) -> StoreResult<Self> {
        info!(path = %config.path.display(), "Opening bills archive");

        let target = if config.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            let dir = parent_dir(&config.path);
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
            SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true)
        };
        let options = target
            .journal_mode(SqliteJournalMode::Delete)
            .synchronous(SqliteSynchronous::Full)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        // One connection: writes are sequential and an in-memory database
        // lives only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let archive = BillsArchive {
            pool,
            path: config.path,
        };

        if config.run_migrations {
            migrations::run_migrations(&archive.pool).await?;
        }

        debug!("Bills archive ready");
        Ok(archive)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a sheet already records this bill id.
    pub async fn contains_bill_id(&self, bill_id: &str) -> StoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sheets WHERE bill_id = ?1")
            .bind(bill_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Appends `bill` as a new sheet and returns the sheet name used.
    ///
    /// The sheet is named `Bill_<id>`. If that name is taken a numeric
    /// suffix is added (`Bill_<id>_2`, …); an existing sheet is never
    /// touched. Rows and metadata are written in one transaction.
    pub async fn append_bill(&self, bill: &Bill) -> StoreResult<String> {
        let mut tx = self.pool.begin().await?;

        let base = bill.sheet_name();
        let mut name = base.clone();
        let mut attempt = 1;
        loop {
            let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sheets WHERE name = ?1")
                .bind(&name)
                .fetch_one(&mut *tx)
                .await?;
            if taken == 0 {
                break;
            }
            attempt += 1;
            name = format!("{}_{}", base, attempt);
        }

        sqlx::query(
            r#"
            INSERT INTO sheets (
                name, bill_id, created_at,
                subtotal_cents, tax_cents, grand_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&name)
        .bind(bill.id.as_str())
        .bind(bill.created_at)
        .bind(bill.totals.subtotal.cents())
        .bind(bill.totals.tax.cents())
        .bind(bill.totals.grand_total.cents())
        .execute(&mut *tx)
        .await?;

        for (index, row) in bill.rows().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sheet_rows (
                    sheet_name, row_index, barcode, name, qty, unit_price, total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&name)
            .bind(index as i64)
            .bind(&row.barcode)
            .bind(&row.name)
            .bind(&row.qty)
            .bind(&row.unit_price)
            .bind(&row.total)
            .execute(&mut *tx)
            .await?;
        }

        for (position, (label, value)) in bill.metadata().into_iter().enumerate() {
            sqlx::query(
                "INSERT INTO sheet_cells (sheet_name, position, label, value) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&name)
            .bind(position as i64)
            .bind(label)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            sheet = %name,
            bill_id = %bill.id,
            lines = bill.lines.len(),
            grand_total = %bill.totals.grand_total,
            "Bill archived"
        );
        Ok(name)
    }

    /// All sheets, oldest first.
    pub async fn list_sheets(&self) -> StoreResult<Vec<SheetSummary>> {
        let sheets = sqlx::query_as::<_, SheetSummary>(
            r#"
            SELECT name, bill_id, created_at, subtotal_cents, tax_cents, grand_total_cents
            FROM sheets
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sheets.len(), "Listed bill sheets");
        Ok(sheets)
    }

    /// Reads one sheet with its rows and metadata cells.
    pub async fn read_sheet(&self, name: &str) -> StoreResult<ArchivedSheet> {
        let summary = sqlx::query_as::<_, SheetSummary>(
            r#"
            SELECT name, bill_id, created_at, subtotal_cents, tax_cents, grand_total_cents
            FROM sheets
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found("Sheet", name))?;

        let rows = sqlx::query_as::<_, SheetRowRecord>(
            r#"
            SELECT barcode, name, qty, unit_price, total
            FROM sheet_rows
            WHERE sheet_name = ?1
            ORDER BY row_index
            "#,
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(BillRow::from)
        .collect();

        let cells = sqlx::query_as::<_, SheetCell>(
            "SELECT label, value FROM sheet_cells WHERE sheet_name = ?1 ORDER BY position",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        Ok(ArchivedSheet {
            summary,
            rows,
            cells,
        })
    }

    pub async fn sheet_count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sheets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Checks the archive answers queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// Closes the connection. The file is complete on disk afterwards.
    pub async fn close(&self) {
        info!("Closing bills archive");
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
