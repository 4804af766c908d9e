//! Connection handling for the SQLite database.

use std::{
    path::Path,
    str::FromStr,
    time::Duration,
};

use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, SqlitePool,
};
use tracing::{debug, info};

pub mod migrations;

/// `database_location` value selecting a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

pub async fn connect_to_db(database_location: &Path) -> Result<SqlitePool> {
    if database_location == Path::new(IN_MEMORY) {
        debug!("Opening in-memory database.");
        // Every connection to :memory: sees its own database, so the pool
        // must hold exactly one and never recycle it.
        return Ok(SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true))
            .await?);
    }

    if let Some(parent) = database_location.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    info!("Opening database at {}.", database_location.display());
    Ok(Pool::connect_with(
        SqliteConnectOptions::new()
            .filename(database_location)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .create_if_missing(true),
    )
    .await?)
}
