use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tiered_cache::TieredCache;
use watchlist_core::FetchError;

/// Where a signal value came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome<T> {
    /// Cache hit within TTL
    Cached { value: T },
    /// Live answer from the named provider
    Fetched { provider: String, value: T },
    /// Every provider failed; last known value regardless of age
    Stale { value: T },
    /// Nothing live, nothing cached
    Unavailable { reason: String },
}

impl<T> FetchOutcome<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            FetchOutcome::Cached { value }
            | FetchOutcome::Fetched { value, .. }
            | FetchOutcome::Stale { value } => Some(value),
            FetchOutcome::Unavailable { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            FetchOutcome::Cached { value }
            | FetchOutcome::Fetched { value, .. }
            | FetchOutcome::Stale { value } => Some(value),
            FetchOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale { .. })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, FetchOutcome::Unavailable { .. })
    }
}

/// One provider call in a fallback chain
pub(crate) struct Attempt<'a, T> {
    pub provider: String,
    pub call: BoxFuture<'a, Result<T, FetchError>>,
}

impl<'a, T> Attempt<'a, T> {
    pub fn new(provider: &str, call: BoxFuture<'a, Result<T, FetchError>>) -> Self {
        Self {
            provider: provider.to_string(),
            call,
        }
    }
}

/// Cache-first resolution of one signal.
///
/// Order: fresh cache, each provider in turn (bounded by `timeout`), stale
/// cache, unavailable. Only successful provider answers are cached.
pub(crate) async fn resolve<T>(
    cache: &TieredCache,
    key: &str,
    ttl: Duration,
    timeout: Duration,
    attempts: Vec<Attempt<'_, T>>,
) -> FetchOutcome<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    if let Some(value) = cache.get::<T>(key, ttl).await {
        return FetchOutcome::Cached { value };
    }

    let mut failures = Vec::new();
    if attempts.is_empty() {
        failures.push(FetchError::NotConfigured(key.to_string()).to_string());
    }

    for attempt in attempts {
        let result = match tokio::time::timeout(timeout, attempt.call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout.as_millis() as u64)),
        };
        match result {
            Ok(value) => {
                if let Err(e) = cache.set(key, &value) {
                    tracing::warn!("Could not cache {} from {}: {}", key, attempt.provider, e);
                }
                return FetchOutcome::Fetched {
                    provider: attempt.provider,
                    value,
                };
            }
            Err(e) => {
                tracing::warn!("{} failed for {}: {}", attempt.provider, key, e);
                failures.push(format!("{}: {}", attempt.provider, e));
            }
        }
    }

    // another worker may have refreshed the key while we were failing
    if let Some(value) = cache.get::<T>(key, ttl).await {
        return FetchOutcome::Cached { value };
    }
    if let Some(value) = cache.get_raw::<T>(key).await {
        tracing::info!("Serving stale {} after provider failures", key);
        return FetchOutcome::Stale { value };
    }

    tracing::warn!("{} unavailable: {}", key, failures.join("; "));
    FetchOutcome::Unavailable {
        reason: failures.join("; "),
    }
}
