//! Database initialization
//!
//! Opens the SQLite store behind a connection pool. Creating the file is
//! opt-in so that read-side tools never conjure an empty store.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open a pool on the store at `db_path`
///
/// With `create` set, the file and its parent directory are created when
/// missing. Otherwise a missing file is an error.
pub async fn open_database(db_path: &Path, create: bool) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if create {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    // Rollback journal keeps the store a single file, so a staged store can
    // be renamed into place once the pool is closed.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(create)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Delete)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    Ok(pool)
}

/// Remove the store file and any SQLite sidecar files next to it
///
/// Returns whether the main store file existed.
pub fn remove_database_files(db_path: &Path) -> Result<bool> {
    let existed = db_path.exists();
    if existed {
        std::fs::remove_file(db_path)?;
    }

    for suffix in ["-journal", "-wal", "-shm"] {
        let mut sidecar = db_path.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = Path::new(&sidecar);
        if sidecar.exists() {
            std::fs::remove_file(sidecar)?;
        }
    }

    Ok(existed)
}
