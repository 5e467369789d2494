use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::CacheError;

/// One durable row: serialized JSON payload plus its write time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub key: String,
    pub data: String,
    pub updated_at: DateTime<Utc>,
}

/// Persistent layer behind the in-process map
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError>;

    /// Insert or replace the row for `entry.key`. A row with a newer
    /// `updated_at` is left untouched.
    async fn upsert(&self, entry: &StoredEntry) -> Result<(), CacheError>;

    /// Remove every row, returning how many were removed
    async fn clear(&self) -> Result<u64, CacheError>;
}

/// Non-persistent store for ephemeral runs and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: DashMap<String, StoredEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        Ok(self.rows.get(key).map(|row| row.value().clone()))
    }

    async fn upsert(&self, entry: &StoredEntry) -> Result<(), CacheError> {
        self.rows
            .entry(entry.key.clone())
            .and_modify(|row| {
                if row.updated_at <= entry.updated_at {
                    *row = entry.clone();
                }
            })
            .or_insert_with(|| entry.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        let removed = self.rows.len() as u64;
        self.rows.clear();
        Ok(removed)
    }
}
