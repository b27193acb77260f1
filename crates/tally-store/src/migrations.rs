//! # Archive Migrations
//!
//! Embedded SQL migrations for the bills archive.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  BillsArchive::open                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (created when missing)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  001_bills_archive.sql  ✓ applied once, recorded with checksum         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Archive ready                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. **NEVER** modify an existing migration: archives in the field already
//!    recorded its checksum

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending archive migrations.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending archive migrations");

    MIGRATOR.run(pool).await?;

    info!("Archive migrations applied");
    Ok(())
}

/// Returns `(total, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveConfig, BillsArchive};

    #[tokio::test]
    async fn test_migrations_recorded_and_idempotent() {
        let archive = BillsArchive::open(ArchiveConfig::in_memory()).await.unwrap();
        run_migrations(archive.pool()).await.unwrap();

        let (total, applied) = migration_status(archive.pool()).await.unwrap();
        assert_eq!(total, applied);
        assert!(total >= 1);
    }
}
