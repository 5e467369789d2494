use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Notify};

use crate::stats::CacheCounters;
use crate::{DurableStore, StoredEntry};

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

enum WriteCommand {
    /// Persist whatever is pending for this key
    Persist(String),
    Flush(oneshot::Sender<()>),
}

/// Newest unpersisted entry per key. A key is in the queue at most once;
/// later writes to it just replace the pending entry.
type Pending = Arc<DashMap<String, StoredEntry>>;

/// Handle to the background task that persists cache writes
pub(crate) struct WriteBehind {
    tx: mpsc::Sender<WriteCommand>,
    pending: Pending,
    overflow: Arc<Notify>,
    counters: Arc<CacheCounters>,
}

impl WriteBehind {
    /// Must be called from inside a tokio runtime
    pub fn spawn(store: Arc<dyn DurableStore>, capacity: usize, counters: Arc<CacheCounters>) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let pending: Pending = Arc::new(DashMap::new());
        let overflow = Arc::new(Notify::new());
        tokio::spawn(run_writer(store, rx, pending.clone(), overflow.clone(), counters.clone()));
        Self {
            tx,
            pending,
            overflow,
            counters,
        }
    }

    /// Record `entry` as the key's pending write without waiting on storage.
    ///
    /// When the queue is full the entry stays pending and the worker sweeps
    /// it on its next pass, so the newest value per key is never lost.
    pub fn enqueue(&self, entry: StoredEntry) {
        let key = entry.key.clone();
        let newly_pending = match self.pending.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                if slot.get().updated_at <= entry.updated_at {
                    slot.insert(entry);
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
        };
        if !newly_pending {
            return;
        }

        match self.tx.try_send(WriteCommand::Persist(key)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                CacheCounters::bump(&self.counters.deferred_writes);
                self.overflow.notify_one();
            }
            Err(TrySendError::Closed(WriteCommand::Persist(key))) => {
                self.pending.remove(&key);
                CacheCounters::bump(&self.counters.dropped_writes);
                tracing::warn!("Skipping durable write for {}: writer stopped", key);
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Resolves once every write issued before this call has been attempted
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(ack_tx)).await.is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

async fn run_writer(
    store: Arc<dyn DurableStore>,
    mut rx: mpsc::Receiver<WriteCommand>,
    pending: Pending,
    overflow: Arc<Notify>,
    counters: Arc<CacheCounters>,
) {
    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(WriteCommand::Persist(key)) => {
                    // already swept when missing
                    if let Some((_, entry)) = pending.remove(&key) {
                        persist(store.as_ref(), &entry, &counters).await;
                    }
                }
                Some(WriteCommand::Flush(ack)) => {
                    drain_pending(store.as_ref(), &pending, &counters).await;
                    let _ = ack.send(());
                }
                None => break,
            },
            _ = overflow.notified() => drain_pending(store.as_ref(), &pending, &counters).await,
        }
    }
    tracing::debug!("Durable cache writer stopped");
}

async fn drain_pending(store: &dyn DurableStore, pending: &DashMap<String, StoredEntry>, counters: &CacheCounters) {
    let keys: Vec<String> = pending.iter().map(|e| e.key().clone()).collect();
    for key in keys {
        if let Some((_, entry)) = pending.remove(&key) {
            persist(store, &entry, counters).await;
        }
    }
}

async fn persist(store: &dyn DurableStore, entry: &StoredEntry, counters: &CacheCounters) {
    for attempt in 1..=MAX_ATTEMPTS {
        match store.upsert(entry).await {
            Ok(()) => return,
            Err(e) if attempt < MAX_ATTEMPTS => {
                tracing::debug!("Durable write for {} failed (attempt {}): {}", entry.key, attempt, e);
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(e) => {
                CacheCounters::bump(&counters.failed_writes);
                tracing::warn!(
                    "Giving up on durable write for {} after {} attempts: {}",
                    entry.key,
                    MAX_ATTEMPTS,
                    e
                );
            }
        }
    }
}
