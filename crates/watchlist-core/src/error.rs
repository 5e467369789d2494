use thiserror::Error;

/// Failure of a single provider call. Never fatal to callers: the fallback
/// chain turns it into a stale or unavailable result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("No provider configured for {0}")]
    NotConfigured(String),
}
