//! Request-keyed response cache used as a transport-level offline fallback.
//!
//! This module provides a cache of raw responses that:
//! - Stores at most one response per request key in each named partition
//! - Overwrites on put (no versioning)
//! - Is shared by the sync engine (data partition) and the intercept proxy
//!   (both partitions)

mod keys;
mod storage;
mod traits;

pub use storage::{NoopResponseCache, SqliteResponseCache};
pub use traits::{ResponseCache, DATA_PARTITION, KNOWN_PARTITIONS, STATIC_PARTITION};
