use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    pub memory_hits: AtomicU64,
    pub durable_hits: AtomicU64,
    pub misses: AtomicU64,
    pub raw_hits: AtomicU64,
    pub writes: AtomicU64,
    pub deferred_writes: AtomicU64,
    pub dropped_writes: AtomicU64,
    pub failed_writes: AtomicU64,
}

impl CacheCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, memory_entries: usize) -> CacheStats {
        CacheStats {
            memory_entries,
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            durable_hits: self.durable_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            raw_hits: self.raw_hits.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deferred_writes: self.deferred_writes.load(Ordering::Relaxed),
            dropped_writes: self.dropped_writes.load(Ordering::Relaxed),
            failed_writes: self.failed_writes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub memory_entries: usize,
    pub memory_hits: u64,
    pub durable_hits: u64,
    pub misses: u64,
    /// TTL-ignoring reads that found a value
    pub raw_hits: u64,
    pub writes: u64,
    /// Writes that found the queue full and were left for the worker's sweep
    pub deferred_writes: u64,
    /// Durable writes skipped because the writer had stopped
    pub dropped_writes: u64,
    /// Durable writes abandoned after retries
    pub failed_writes: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.durable_hits;
        let total = hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }
}
