use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::{CacheError, DurableStore, StoredEntry};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache (
    key TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

/// SQLite-backed durable layer, one row per cache key
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `database_url`
    pub async fn connect(database_url: &str) -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database. Pinned to a single connection, since every
    /// SQLite connection would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, CacheError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let row: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT data, updated_at FROM cache WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(data, updated_at)| StoredEntry {
            key: key.to_string(),
            data,
            updated_at,
        }))
    }

    async fn upsert(&self, entry: &StoredEntry) -> Result<(), CacheError> {
        sqlx::query(
            "INSERT INTO cache (key, data, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at
             WHERE excluded.updated_at >= cache.updated_at",
        )
        .bind(&entry.key)
        .bind(&entry.data)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM cache").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap()
    }

    fn entry(key: &str, data: &str, updated_at: DateTime<Utc>) -> StoredEntry {
        StoredEntry {
            key: key.to_string(),
            data: data.to_string(),
            updated_at,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        let t0 = t0();

        store.upsert(&entry("vix", r#"{"v":1}"#, t0)).await.unwrap();
        store
            .upsert(&entry("vix", r#"{"v":2}"#, t0 + Duration::seconds(5)))
            .await
            .unwrap();

        let row = store.load("vix").await.unwrap().unwrap();
        assert_eq!(row.data, r#"{"v":2}"#);
        assert_eq!(row.updated_at, t0 + Duration::seconds(5));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cache")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_older_write_does_not_replace_newer_row() {
        let store = SqliteStore::in_memory().await.unwrap();
        let newer = t0() + Duration::milliseconds(500);

        store.upsert(&entry("cpi", r#"{"v":2}"#, newer)).await.unwrap();
        store.upsert(&entry("cpi", r#"{"v":1}"#, t0())).await.unwrap();

        let row = store.load("cpi").await.unwrap().unwrap();
        assert_eq!(row.data, r#"{"v":2}"#);
        assert_eq!(row.updated_at, newer);
    }

    #[tokio::test]
    async fn test_load_missing_key() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_reports_rows() {
        let store = SqliteStore::in_memory().await.unwrap();
        let now = t0();
        store.upsert(&entry("a", "1", now)).await.unwrap();
        store.upsert(&entry("b", "2", now)).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.load("a").await.unwrap().is_none());
    }
}
