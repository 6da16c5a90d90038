//! SQLite-backed [`Storage`] implementation.
//!
//! Each slot is one row of the `kv_store` table. Writes replace the whole
//! value, matching the one-blob-per-key contract of the storage trait.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use image_annotations_core::storage::Storage;

/// SQLite implementation of the [`Storage`] trait.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Unix timestamp of the last write to `key`.
    pub async fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        let ts: Option<i64> = sqlx::query_scalar("SELECT updated_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ts)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
