//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions, one submodule per table.
//!
//! All these interactions are simple functions that accept a `&mut SqliteConnection` argument. Callers can obtain a
//! connection from a pool, or open a transaction and pass `&mut *tx` through to the functions without any other
//! changes.
//!
//! ## Locking
//!
//! SQLite has no row locks. A transaction takes the database write lock with its first write statement and keeps it
//! until it commits or rolls back. Every multi-statement write in this crate therefore starts with a write (a guarded
//! `UPDATE` or a `DELETE ... RETURNING`) rather than a read, so that it waits on `busy_timeout` for competing writers
//! and then reads their committed state.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;
pub mod wallets;

const SQLITE_DB_URL: &str = "sqlite://data/marketplace.db";

pub fn db_url() -> String {
    let result = env::var("MKP_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ MKP_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Creates a connection pool for `url`.
///
/// `lock_wait` bounds both the time spent waiting for a free connection and the time a statement waits for another
/// writer to release the database lock.
pub async fn new_pool(url: &str, max_connections: u32, lock_wait: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(lock_wait)
        .foreign_keys(true);
    let pool =
        SqlitePoolOptions::new().max_connections(max_connections).acquire_timeout(lock_wait).connect_with(options).await?;
    Ok(pool)
}
