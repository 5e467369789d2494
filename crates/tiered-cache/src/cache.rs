use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stats::CacheCounters;
use crate::writer::WriteBehind;
use crate::{CacheError, CacheStats, Clock, DurableStore, MemoryStore, StoredEntry, SystemClock};

pub const DEFAULT_WRITE_QUEUE: usize = 1024;

/// In-process cache entry with timestamp
#[derive(Clone)]
struct MemoryEntry {
    payload: Arc<Value>,
    updated_at: DateTime<Utc>,
}

/// Fast layer (DashMap) over a durable layer.
///
/// `set` lands in memory synchronously and reaches the durable layer through
/// a background writer; `get` promotes fresh durable rows into memory.
/// Constructors spawn the writer, so they must run inside a tokio runtime.
pub struct TieredCache {
    memory: DashMap<String, MemoryEntry>,
    durable: Arc<dyn DurableStore>,
    writer: WriteBehind,
    clock: Arc<dyn Clock>,
    counters: Arc<CacheCounters>,
}

impl TieredCache {
    pub fn new(durable: Arc<dyn DurableStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_queue_capacity(durable, clock, DEFAULT_WRITE_QUEUE)
    }

    pub fn with_queue_capacity(durable: Arc<dyn DurableStore>, clock: Arc<dyn Clock>, capacity: usize) -> Self {
        let counters = Arc::new(CacheCounters::default());
        let writer = WriteBehind::spawn(durable.clone(), capacity, counters.clone());
        Self {
            memory: DashMap::new(),
            durable,
            writer,
            clock,
            counters,
        }
    }

    /// Memory-only durable layer and the system clock
    pub fn ephemeral() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Value for `key` if it was written less than `ttl` ago
    pub async fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let now = self.clock.now();

        let cached = self.memory.get(key).map(|entry| entry.value().clone());
        if let Some(entry) = cached {
            if is_fresh(entry.updated_at, now, ttl) {
                if let Some(value) = decode::<T>(key, &entry.payload) {
                    CacheCounters::bump(&self.counters.memory_hits);
                    return Some(value);
                }
            }
        }

        if let Some((payload, updated_at)) = self.load_durable(key).await {
            if is_fresh(updated_at, now, ttl) {
                if let Some(value) = decode::<T>(key, &payload) {
                    self.promote(key, payload, updated_at);
                    CacheCounters::bump(&self.counters.durable_hits);
                    return Some(value);
                }
            }
        }

        CacheCounters::bump(&self.counters.misses);
        None
    }

    /// Most recent value for `key` regardless of age
    pub async fn get_raw<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = self.memory.get(key).map(|entry| entry.payload.clone());
        // an undecodable memory entry falls through to the durable copy
        let value = match cached.and_then(|payload| decode::<T>(key, &payload)) {
            Some(value) => Some(value),
            None => {
                let (payload, _) = self.load_durable(key).await?;
                decode::<T>(key, &payload)
            }
        };
        if value.is_some() {
            CacheCounters::bump(&self.counters.raw_hits);
        }
        value
    }

    /// Write to memory now; persist in the background. Only serialization
    /// can fail here.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let payload = serde_json::to_value(value)?;
        let data = payload.to_string();
        let updated_at = self.clock.now();

        self.memory.insert(
            key.to_string(),
            MemoryEntry {
                payload: Arc::new(payload),
                updated_at,
            },
        );
        CacheCounters::bump(&self.counters.writes);

        self.writer.enqueue(StoredEntry {
            key: key.to_string(),
            data,
            updated_at,
        });
        Ok(())
    }

    /// Wait until every write issued so far has reached the durable layer
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Drop every entry from both layers. Pending writes are drained first so
    /// they cannot resurrect a key afterwards.
    pub async fn invalidate_all(&self) -> Result<u64, CacheError> {
        self.flush().await;
        let cleared = self.durable.clear().await;
        self.memory.clear();

        let removed = cleared?;
        tracing::info!("Cache invalidated: {} durable rows removed", removed);
        Ok(removed)
    }

    pub fn evict(&self, key: &str) {
        self.memory.remove(key);
    }

    /// Clears the fast layer only; durable rows stay
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.memory.len())
    }

    async fn load_durable(&self, key: &str) -> Option<(Value, DateTime<Utc>)> {
        let stored = match self.durable.load(key).await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!("Durable cache read failed for {}: {}", key, e);
                return None;
            }
        };
        match serde_json::from_str::<Value>(&stored.data) {
            Ok(payload) => Some((payload, stored.updated_at)),
            Err(e) => {
                tracing::warn!("Corrupt durable cache row for {}: {}", key, e);
                None
            }
        }
    }

    /// Copy a durable row into memory unless a newer write got there first
    fn promote(&self, key: &str, payload: Value, updated_at: DateTime<Utc>) {
        let promoted = MemoryEntry {
            payload: Arc::new(payload),
            updated_at,
        };
        self.memory
            .entry(key.to_string())
            .and_modify(|current| {
                if current.updated_at < updated_at {
                    *current = promoted.clone();
                }
            })
            .or_insert(promoted);
    }
}

fn is_fresh(updated_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    let age = now.signed_duration_since(updated_at);
    chrono::Duration::from_std(ttl).map(|ttl| age < ttl).unwrap_or(true)
}

fn decode<T: DeserializeOwned>(key: &str, payload: &Value) -> Option<T> {
    match T::deserialize(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Cached value for {} has unexpected shape: {}", key, e);
            None
        }
    }
}

/// Serializable view of an entry, used by operator tooling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    pub key: String,
    pub updated_at: DateTime<Utc>,
    pub age_secs: i64,
}

impl TieredCache {
    /// Keys currently held in memory with their ages, oldest first
    pub fn memory_entries(&self) -> Vec<EntryInfo> {
        let now = self.clock.now();
        let mut entries: Vec<EntryInfo> = self
            .memory
            .iter()
            .map(|entry| EntryInfo {
                key: entry.key().clone(),
                updated_at: entry.updated_at,
                age_secs: (now - entry.updated_at).num_seconds(),
            })
            .collect();
        entries.sort_by_key(|e| e.updated_at);
        entries
    }
}
