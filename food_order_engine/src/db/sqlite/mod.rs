//! # SQLite backend
//!
//! The low-level queries live in plain functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open an atomic transaction and
//! pass `&mut *tx` through without any other changes.
//!
//! [`SqliteDatabase`] ties these functions together and implements the engine's storage traits.
mod db;

pub mod catalog;
pub mod group_orders;
pub mod orders;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::StorageError;

const SQLITE_DB_URL: &str = "sqlite://data/food_orders.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn db_url() -> String {
    let result = env::var("FOS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ FOS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a pool in WAL mode. Writers wait on each other for up to [`BUSY_TIMEOUT`] instead of failing immediately.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
