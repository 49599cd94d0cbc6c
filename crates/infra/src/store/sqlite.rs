//! SQLite-backed key-value store for cart snapshots.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::r#trait::{DurableStore, StoreError};

/// SQLite-backed durable store.
///
/// One row per key; writes are upserts so a key always holds exactly one
/// snapshot.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store directory at {:?}", parent))?;
        }

        let db_url = format!("sqlite://{}", path.to_string_lossy());
        Self::connect(&db_url).await
    }

    /// Connect using a sqlx SQLite URL (e.g. `sqlite::memory:`).
    pub async fn connect(db_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("invalid SQLite URL {db_url:?}"))?
            .create_if_missing(true);

        // Single connection: one writer, and `:memory:` databases stay shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to create SQLite pool at {db_url:?}"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cart_snapshots (
                key       TEXT NOT NULL PRIMARY KEY,
                data      TEXT NOT NULL,
                saved_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to create cart_snapshots table")?;

        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl DurableStore for SqliteStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM cart_snapshots
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Read(e.to_string()))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let data: String = row
            .try_get("data")
            .map_err(|e| StoreError::Read(e.to_string()))?;

        Ok(Some(data))
    }

    async fn write(&self, key: &str, blob: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO cart_snapshots (key, data, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                data = excluded.data,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(key)
        .bind(blob)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Write(e.to_string()))?;

        Ok(())
    }
}
