//! SQLite persistence, the single source of truth for fetched data.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::AppError;

mod migrations;
mod models;
mod repository;

pub use migrations::run_migrations;
pub use models::{
    MatchRecord, NewPlayer, NewRank, ParticipantRecord, Player, RankQueue, RankSnapshot,
};
pub use repository::Repository;

/// Opens the pool, creating the database file if needed, and applies the schema.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!(database_url, "🗄️ Database connected");
    run_migrations(&pool).await?;
    Ok(pool)
}

/// A migrated in-memory database. One connection, kept alive, since every
/// new SQLite memory connection is a distinct empty database.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
