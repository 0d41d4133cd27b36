//! Database Module
//!
//! SQLite connection pool and migrations for the numbering store.

pub mod counters;
pub mod ledger;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Open the on-disk database with WAL mode and apply migrations
pub async fn connect(database_path: &str) -> Result<SqlitePool, BoxError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("foreign_keys", "ON");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // busy_timeout: wait up to 5s on write contention instead of failing
    sqlx::query("PRAGMA busy_timeout = 5000;").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database ready (SQLite WAL, busy_timeout=5000ms)");

    Ok(pool)
}

/// Open an in-memory database (tests)
///
/// Capped at one connection so the in-memory database is shared by every
/// caller of the pool.
pub async fn connect_in_memory() -> Result<SqlitePool, BoxError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
