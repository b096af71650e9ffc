//! Catalog of media records keyed by content identity
//!
//! Writes go through one async mutex shared by every ingest worker, so two upserts never
//! interleave. Reads take no lock and rely on SQLite's per-statement atomicity.

use crate::models::{CatalogField, Record};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tunedex_common::{Error, Result};

const SELECT_COLUMNS: &str = "SELECT Identity, Title, Creator, Collection, Genre, ReleaseYear, \
     EncodingFormat, ContainerType, PublicPath, SizeBytes FROM songs";

/// Persistent record store
#[derive(Clone)]
pub struct Catalog {
    pool: SqlitePool,
    write_guard: Arc<Mutex<()>>,
}

impl Catalog {
    /// Open the catalog stored at `db_path`, creating it if needed
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = super::init_database_pool(db_path).await?;
        Ok(Self::from_pool(pool))
    }

    /// Catalog that lives only as long as this process
    pub async fn in_memory() -> Result<Self> {
        let pool = super::init_memory_pool().await?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap a pool whose `songs` table already exists
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert `record`, or replace every column of the row with the same identity
    pub async fn upsert(&self, record: &Record) -> Result<()> {
        let size_bytes = i64::try_from(record.size_bytes).map_err(|_| {
            Error::InvalidInput(format!("size {} does not fit the catalog", record.size_bytes))
        })?;

        let _guard = self.write_guard.lock().await;

        sqlx::query(
            r#"
            INSERT INTO songs (
                Identity, Title, Creator, Collection, Genre, ReleaseYear,
                EncodingFormat, ContainerType, PublicPath, SizeBytes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(Identity) DO UPDATE SET
                Title = excluded.Title,
                Creator = excluded.Creator,
                Collection = excluded.Collection,
                Genre = excluded.Genre,
                ReleaseYear = excluded.ReleaseYear,
                EncodingFormat = excluded.EncodingFormat,
                ContainerType = excluded.ContainerType,
                PublicPath = excluded.PublicPath,
                SizeBytes = excluded.SizeBytes
            "#,
        )
        .bind(&record.identity)
        .bind(&record.title)
        .bind(&record.creator)
        .bind(&record.collection)
        .bind(&record.genre)
        .bind(record.release_year.map(i64::from))
        .bind(&record.encoding_format)
        .bind(&record.container_type)
        .bind(&record.public_path)
        .bind(size_bytes)
        .execute(&self.pool)
        .await?;

        tracing::trace!(identity = %record.identity, path = %record.public_path, "Upserted record");

        Ok(())
    }

    /// Every record, ordered by identity
    pub async fn find_all(&self) -> Result<Vec<Record>> {
        let rows = sqlx::query(&format!("{} ORDER BY Identity", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Records whose `field` equals `value` exactly (case-sensitive, no wildcards)
    ///
    /// Integer fields compare numerically; a value that is not an integer matches nothing.
    pub async fn find_by_field(&self, field: CatalogField, value: &str) -> Result<Vec<Record>> {
        // The column name comes from the closed CatalogField enum, never from the caller
        let sql = format!("{} WHERE {} = ? ORDER BY Identity", SELECT_COLUMNS, field.column());

        let query = sqlx::query(&sql);
        let query = if field.is_integer() {
            match value.parse::<i64>() {
                Ok(number) => query.bind(number),
                Err(_) => return Ok(Vec::new()),
            }
        } else {
            query.bind(value)
        };

        let rows = query.fetch_all(&self.pool).await?;

        tracing::debug!(field = %field, value, found = rows.len(), "Field lookup");

        rows.iter().map(record_from_row).collect()
    }

    /// The record with this identity, if any
    pub async fn find_by_identity(&self, identity: &str) -> Result<Option<Record>> {
        let row = sqlx::query(&format!("{} WHERE Identity = ?", SELECT_COLUMNS))
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Number of records
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record> {
    let release_year: Option<i64> = row.try_get("ReleaseYear")?;
    let size_bytes: i64 = row.try_get("SizeBytes")?;

    Ok(Record {
        identity: row.try_get("Identity")?,
        title: row.try_get("Title")?,
        creator: row.try_get("Creator")?,
        collection: row.try_get("Collection")?,
        genre: row.try_get("Genre")?,
        release_year: release_year.and_then(|y| u32::try_from(y).ok()),
        encoding_format: row.try_get("EncodingFormat")?,
        container_type: row.try_get("ContainerType")?,
        public_path: row.try_get("PublicPath")?,
        size_bytes: u64::try_from(size_bytes)
            .map_err(|_| Error::Internal(format!("negative SizeBytes {} in catalog", size_bytes)))?,
    })
}
