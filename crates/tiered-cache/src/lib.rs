//! Two-layer TTL cache: a concurrent in-process map in front of a durable
//! store, with durable writes handed to a background worker.

pub mod cache;
pub mod clock;
pub mod error;
pub mod sqlite;
pub mod stats;
pub mod store;
mod writer;

#[cfg(test)]
mod tests;

pub use cache::*;
pub use clock::*;
pub use error::*;
pub use sqlite::SqliteStore;
pub use stats::*;
pub use store::*;
