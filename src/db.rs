//! Connection pool and schema management.
//!
//! The application talks to SQLite through a `sqlx` pool. The schema lives in
//! `migrations/` and is embedded into the binary at compile time, so a fresh
//! database (including an in-memory one) is usable right after [`migrate`].

use log::{debug, info};
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Transaction;
use std::str::FromStr;

/// Opens a pool for `database_url`.
///
/// Foreign keys are switched on for every connection and a missing database file
/// is created. An in-memory database only exists as long as its single connection,
/// so that connection is pinned open for the lifetime of the pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if is_in_memory(database_url) {
        debug!("Using a single pinned connection for in-memory database");
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?
    };

    info!("Database pool ready");
    Ok(pool)
}

/// Applies every pending migration.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Begins a transaction that holds the database write lock from the start.
///
/// Use it for every transaction that reads and then writes. A plain `BEGIN` only
/// takes a read lock, and SQLite refuses to upgrade that lock while another
/// connection is writing: the request fails with `SQLITE_BUSY` at once instead of
/// waiting out the busy timeout. `BEGIN IMMEDIATE` queues behind other writers.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    // The deferred BEGIN issued by sqlx has not touched the database yet. Swap it
    // for an immediate one; sqlx's own COMMIT/ROLLBACK then ends that instead.
    sqlx::query("COMMIT").execute(&mut *tx).await?;
    if let Err(e) = sqlx::query("BEGIN IMMEDIATE").execute(&mut *tx).await {
        // Keep a transaction open so the rollback sqlx issues on drop has one to end.
        sqlx::query("BEGIN").execute(&mut *tx).await?;
        return Err(e);
    }

    Ok(tx)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
