//! Nest Storage
//!
//! `SQLite` persistence for playlist forests.
//!
//! # Architecture
//!
//! - **Per-owner scoping**: every query filters by owner; foreign rows read as missing
//! - **Vertical Slicing**: `nodes` and `memberships` own their queries
//! - **Atomic change sets**: [`SqliteNodeStore`] commits a whole `ChangeSet` in one
//!   transaction, checking its expectations first
//! - **Cascade**: deleting a node removes its subtree and memberships through
//!   `ON DELETE CASCADE`
//!
//! # Example
//!
//! ```rust,no_run
//! use nest_core::{NodeStore, OwnerId};
//! use nest_storage::{create_pool, run_migrations, SqliteNodeStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://nest.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SqliteNodeStore::new(pool);
//! let forest = store.load_forest(&OwnerId::new("alice")).await?;
//! println!("{} playlists", forest.node_count());
//! # Ok(())
//! # }
//! ```

mod context;
mod error;

// Vertical slices
pub mod memberships;
pub mod nodes;

pub use context::SqliteNodeStore;
pub use error::StorageError;

use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before the pool is handed to a store.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://nest.db>`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(url = %database_url, "creating sqlite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("sqlite pool ready");

    Ok(pool)
}

pub(crate) fn order_from_column(position: i64) -> error::Result<u32> {
    u32::try_from(position)
        .map_err(|_| StorageError::Corrupt(format!("position {} out of range", position)))
}

pub(crate) fn timestamp_from_column(millis: i64) -> error::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::Corrupt(format!("invalid timestamp {}", millis)))
}
