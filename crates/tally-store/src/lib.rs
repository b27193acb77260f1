//! # tally-store: Persistence and Billing Engine for Tally POS
//!
//! Loads and saves the inventory file, keeps the bills archive, and runs the
//! finalize protocol that ties the two together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  tally-inventory / tally-billing                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tally-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  repository   │    │    billing    │    │   archive    │  │   │
//! │  │   │  snapshot +   │◄───│ BillingEngine │───►│ BillsArchive │  │   │
//! │  │   │  backend      │    │ cart/finalize │    │ (SQLite)     │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼───────┐    ┌───────────────┐                       │   │
//! │  │   │   backend     │    │    export     │                       │   │
//! │  │   │ CSV / memory  │    │ CSV + backup  │                       │   │
//! │  │   └───────────────┘    └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  inventory.csv                         bills.sqlite                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`backend`] - Inventory backends (CSV file, in-memory)
//! - [`repository`] - Inventory snapshot with explicit reload/persist
//! - [`archive`] - Bills archive and its connection settings
//! - [`migrations`] - Embedded archive migrations
//! - [`billing`] - Billing engine and finalize protocol
//! - [`export`] - CSV export and file backup
//! - [`error`] - Store and billing error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_store::{ArchiveConfig, BillingEngine, BillingPolicy, BillsArchive,
//!                   CsvInventoryFile, InventoryRepository};
//!
//! let inventory = InventoryRepository::open(CsvInventoryFile::new("inventory.csv"))?;
//! let archive = BillsArchive::open(ArchiveConfig::new("bills.sqlite")).await?;
//! let mut engine = BillingEngine::new(inventory, archive, BillingPolicy::default());
//!
//! engine.add_item("8901030", 2)?;
//! let generated = engine.generate_bill(true).await?;
//! println!("Archived as {}", generated.sheet_name);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod archive;
pub mod backend;
pub mod billing;
pub mod error;
pub mod export;
pub mod migrations;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use archive::{ArchiveConfig, ArchivedSheet, BillsArchive, SheetCell, SheetSummary};
pub use backend::{CsvInventoryFile, InventoryBackend, MemoryBackend, INVENTORY_COLUMNS};
pub use billing::{BillingEngine, BillingPolicy, EngineState, GeneratedBill};
pub use error::{BillingError, BillingResult, StoreError, StoreResult};
pub use export::{backup_file, export_bill_csv, export_inventory_csv, write_csv};
pub use repository::InventoryRepository;
