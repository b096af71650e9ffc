//! Database access for tunedex
//!
//! A single SQLite file holds the `songs` table. Connections are configured through
//! `SqliteConnectOptions` so every pooled connection gets the same pragmas.

pub mod catalog;

pub use catalog::Catalog;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tunedex_common::Result;

/// Busy timeout for lock contention between the ingest writer and API readers
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating if missing) the catalog database and ensure the schema exists
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    if newly_created {
        tracing::info!("Initialized new database: {}", db_path.display());
    } else {
        tracing::info!("Opened existing database: {}", db_path.display());
    }

    init_tables(&pool).await?;

    Ok(pool)
}

/// In-memory catalog database
///
/// Restricted to one connection that is never recycled: each SQLite in-memory connection
/// is its own database.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new().in_memory(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the `songs` table if it doesn't exist
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            Identity TEXT NOT NULL PRIMARY KEY,
            Title TEXT NOT NULL DEFAULT '',
            Creator TEXT NOT NULL DEFAULT '',
            Collection TEXT NOT NULL DEFAULT '',
            Genre TEXT NOT NULL DEFAULT '',
            ReleaseYear INTEGER NULL,
            EncodingFormat TEXT NOT NULL DEFAULT '',
            ContainerType TEXT NOT NULL DEFAULT '',
            PublicPath TEXT NOT NULL,
            SizeBytes INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Database tables initialized (songs)");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_database_created_with_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("media.db");

        let pool = init_database_pool(&db_path).await.unwrap();
        assert!(db_path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        // Reopening an existing database is idempotent
        pool.close().await;
        init_database_pool(&db_path).await.unwrap();
    }
}
