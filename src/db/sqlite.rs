use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

/// Creates a SQLite connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The database file (and its parent directory) are created on first use;
/// foreign keys are enforced so interaction rows cannot reference images
/// that were never ingested.
pub async fn create_pool(database_url: &str) -> anyhow::Result<SqlitePool> {
    if let Some(file) = database_url.strip_prefix("sqlite://") {
        if let Some(parent) = Path::new(file).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Creates an in-memory pool for tests.
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is pinned to a single connection that is never reaped.
pub async fn create_memory_pool() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await?;

    Ok(pool)
}
