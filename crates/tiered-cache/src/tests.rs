use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    value: f64,
    label: String,
}

fn reading(value: f64) -> Reading {
    Reading {
        value,
        label: format!("v{}", value),
    }
}

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()))
}

const HOUR: Duration = Duration::from_secs(3600);

/// Durable layer that fails the first `failures` upserts
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl FlakyStore {
    fn new(failures: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DurableStore for FlakyStore {
    async fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        self.inner.load(key).await
    }

    async fn upsert(&self, entry: &StoredEntry) -> Result<(), CacheError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(CacheError::Store("disk unavailable".to_string()));
        }
        self.inner.upsert(entry).await
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        self.inner.clear().await
    }
}

/// Durable layer whose reads always fail
struct UnreadableStore;

#[async_trait]
impl DurableStore for UnreadableStore {
    async fn load(&self, _key: &str) -> Result<Option<StoredEntry>, CacheError> {
        Err(CacheError::Store("database is locked".to_string()))
    }

    async fn upsert(&self, _entry: &StoredEntry) -> Result<(), CacheError> {
        Ok(())
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_set_then_get_returns_value() {
    let cache = TieredCache::new(Arc::new(MemoryStore::new()), manual_clock());
    cache.set("fear_greed", &reading(42.0)).unwrap();

    let got: Option<Reading> = cache.get("fear_greed", HOUR).await;
    assert_eq!(got, Some(reading(42.0)));
    assert_eq!(cache.stats().memory_hits, 1);
}

#[tokio::test]
async fn test_expired_entry_is_absent_but_raw_survives() {
    let clock = manual_clock();
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let cache = TieredCache::new(store, clock.clone());

    cache.set("vix", &reading(18.5)).unwrap();
    cache.flush().await;
    cache.clear_memory();
    clock.advance(chrono::Duration::seconds(3601));

    let fresh: Option<Reading> = cache.get("vix", HOUR).await;
    assert!(fresh.is_none());

    let raw: Option<Reading> = cache.get_raw("vix").await;
    assert_eq!(raw, Some(reading(18.5)));
}

#[tokio::test]
async fn test_stale_memory_entry_is_not_served() {
    let clock = manual_clock();
    let cache = TieredCache::new(Arc::new(MemoryStore::new()), clock.clone());

    cache.set("price:AAPL", &187.2).unwrap();
    clock.advance(chrono::Duration::seconds(10));

    let got: Option<f64> = cache.get("price:AAPL", Duration::from_secs(10)).await;
    assert!(got.is_none());
    let raw: Option<f64> = cache.get_raw("price:AAPL").await;
    assert_eq!(raw, Some(187.2));
}

#[tokio::test]
async fn test_durable_layer_refills_memory() {
    let clock = manual_clock();
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let cache = TieredCache::new(store, clock.clone());

    cache.set("stock:MSFT", &reading(410.0)).unwrap();
    cache.flush().await;
    cache.clear_memory();
    clock.advance(chrono::Duration::minutes(30));

    let got: Option<Reading> = cache.get("stock:MSFT", HOUR).await;
    assert_eq!(got, Some(reading(410.0)));
    assert_eq!(cache.stats().durable_hits, 1);

    // promoted: the second read is served from memory
    let again: Option<Reading> = cache.get("stock:MSFT", HOUR).await;
    assert_eq!(again, Some(reading(410.0)));
    assert_eq!(cache.stats().memory_hits, 1);
}

#[tokio::test]
async fn test_promotion_keeps_original_timestamp() {
    let clock = manual_clock();
    let store = Arc::new(MemoryStore::new());
    let cache = TieredCache::new(store, clock.clone());

    cache.set("cpi", &reading(3.1)).unwrap();
    cache.flush().await;
    cache.clear_memory();

    clock.advance(chrono::Duration::minutes(50));
    let _: Option<Reading> = cache.get("cpi", HOUR).await;

    // promoted copy must still expire one hour after the original write
    clock.advance(chrono::Duration::minutes(11));
    let got: Option<Reading> = cache.get("cpi", HOUR).await;
    assert!(got.is_none());
}

#[tokio::test]
async fn test_survives_restart_through_durable_layer() {
    let clock = manual_clock();
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());

    let first = TieredCache::new(store.clone(), clock.clone());
    first.set("m2", &reading(-3.0)).unwrap();
    first.flush().await;
    drop(first);

    let second = TieredCache::new(store, clock);
    let got: Option<Reading> = second.get("m2", Duration::from_secs(86400)).await;
    assert_eq!(got, Some(reading(-3.0)));
}

#[tokio::test]
async fn test_last_write_wins() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let cache = TieredCache::new(store.clone(), manual_clock());

    cache.set("yield_curve", &reading(0.1)).unwrap();
    cache.set("yield_curve", &reading(0.2)).unwrap();
    cache.flush().await;

    let row = store.load("yield_curve").await.unwrap().unwrap();
    let stored: Reading = serde_json::from_str(&row.data).unwrap();
    assert_eq!(stored, reading(0.2));
}

#[tokio::test]
async fn test_concurrent_sets_never_corrupt() {
    let cache = Arc::new(TieredCache::new(Arc::new(MemoryStore::new()), manual_clock()));
    let writers = 32;

    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.set("stock:NVDA", &reading(i as f64)).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let got: Reading = cache.get("stock:NVDA", HOUR).await.unwrap();
    assert!((0..writers).any(|i| got == reading(i as f64)));

    cache.flush().await;
    cache.clear_memory();
    let persisted: Reading = cache.get("stock:NVDA", HOUR).await.unwrap();
    assert!((0..writers).any(|i| persisted == reading(i as f64)));
}

#[tokio::test]
async fn test_invalidate_all_clears_both_layers() {
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let cache = TieredCache::new(store.clone(), manual_clock());

    cache.set("fear_greed", &reading(20.0)).unwrap();
    cache.set("vix", &reading(31.0)).unwrap();

    // writes still queued are drained before the delete
    let removed = cache.invalidate_all().await.unwrap();
    assert_eq!(removed, 2);

    let fresh: Option<Reading> = cache.get("fear_greed", HOUR).await;
    assert!(fresh.is_none());
    let raw: Option<Reading> = cache.get_raw("vix").await;
    assert!(raw.is_none());
    assert!(store.load("vix").await.unwrap().is_none());
}

#[tokio::test]
async fn test_transient_write_failure_is_retried() {
    let store = Arc::new(FlakyStore::new(2));
    let cache = TieredCache::new(store.clone(), manual_clock());

    cache.set("cpi", &reading(2.9)).unwrap();
    cache.flush().await;

    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    assert!(store.inner.load("cpi").await.unwrap().is_some());
    assert_eq!(cache.stats().failed_writes, 0);
}

#[tokio::test]
async fn test_persistent_write_failure_is_not_fatal() {
    let store = Arc::new(FlakyStore::new(usize::MAX));
    let cache = TieredCache::new(store.clone(), manual_clock());

    cache.set("cpi", &reading(2.9)).unwrap();
    cache.flush().await;

    // memory stays authoritative
    let got: Option<Reading> = cache.get("cpi", HOUR).await;
    assert_eq!(got, Some(reading(2.9)));
    assert!(store.inner.is_empty());
    assert_eq!(cache.stats().failed_writes, 1);
}

#[tokio::test]
async fn test_wrong_shape_is_a_miss() {
    let cache = TieredCache::new(Arc::new(MemoryStore::new()), manual_clock());
    cache.set("vix", &"not a reading").unwrap();

    let got: Option<Reading> = cache.get("vix", HOUR).await;
    assert!(got.is_none());
    assert_eq!(cache.stats().misses, 1);
}

#[tokio::test]
async fn test_memory_entries_report_age() {
    let clock = manual_clock();
    let cache = TieredCache::new(Arc::new(MemoryStore::new()), clock.clone());

    cache.set("a", &1).unwrap();
    clock.advance(chrono::Duration::seconds(30));
    cache.set("b", &2).unwrap();

    let entries = cache.memory_entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].key, "a");
    assert_eq!(entries[0].age_secs, 30);
    assert_eq!(entries[1].age_secs, 0);

    cache.evict("a");
    assert_eq!(cache.stats().memory_entries, 1);
}

#[tokio::test]
async fn test_full_queue_defers_and_keeps_newest_value() {
    let clock = manual_clock();
    let store = Arc::new(MemoryStore::new());
    let cache = TieredCache::with_queue_capacity(store.clone(), clock.clone(), 1);

    // the writer has not run yet, so only the first key fits in the queue
    cache.set("vix", &reading(1.0)).unwrap();
    cache.set("cpi", &reading(3.1)).unwrap();
    cache.set("m2", &reading(-2.0)).unwrap();
    clock.advance(chrono::Duration::seconds(1));
    cache.set("vix", &reading(2.0)).unwrap();
    cache.flush().await;

    let stats = cache.stats();
    assert_eq!(stats.deferred_writes, 2);
    assert_eq!(stats.dropped_writes, 0);
    assert_eq!(stats.failed_writes, 0);
    assert_eq!(store.len(), 3);

    let row = store.load("vix").await.unwrap().unwrap();
    let stored: Reading = serde_json::from_str(&row.data).unwrap();
    assert_eq!(stored, reading(2.0));

    cache.clear_memory();
    let got: Option<Reading> = cache.get("vix", HOUR).await;
    assert_eq!(got, Some(reading(2.0)));
    let got: Option<Reading> = cache.get("m2", HOUR).await;
    assert_eq!(got, Some(reading(-2.0)));
}

#[tokio::test]
async fn test_durable_read_error_is_a_miss() {
    let cache = TieredCache::new(Arc::new(UnreadableStore), manual_clock());

    let got: Option<Reading> = cache.get("fear_greed", HOUR).await;
    assert!(got.is_none());
    let raw: Option<Reading> = cache.get_raw("fear_greed").await;
    assert!(raw.is_none());

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.raw_hits, 0);
}

#[tokio::test]
async fn test_raw_read_skips_undecodable_memory_entry() {
    let store = Arc::new(MemoryStore::new());
    // newer than the clock, so the cache's own write below cannot replace it
    let later = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
    store
        .upsert(&StoredEntry {
            key: "vix".to_string(),
            data: serde_json::to_string(&reading(24.0)).unwrap(),
            updated_at: later,
        })
        .await
        .unwrap();

    let cache = TieredCache::new(store.clone(), manual_clock());
    cache.set("vix", &"not a reading").unwrap();
    cache.flush().await;
    assert_eq!(store.load("vix").await.unwrap().unwrap().updated_at, later);

    let raw: Option<Reading> = cache.get_raw("vix").await;
    assert_eq!(raw, Some(reading(24.0)));
}
