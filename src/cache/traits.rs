//! Core trait and partition names for the response cache.

use crate::error::CacheError;
use crate::net::Response;

/// Partition holding precached static assets.
pub const STATIC_PARTITION: &str = "static-assets";

/// Partition holding API responses.
pub const DATA_PARTITION: &str = "api-data";

/// Partitions that survive proxy activation.
pub const KNOWN_PARTITIONS: &[&str] = &[STATIC_PARTITION, DATA_PARTITION];

/// Trait for response cache backends.
///
/// Every operation must be atomic: the cache is written from the sync engine
/// and from the intercept proxy.
pub trait ResponseCache: Send + Sync {
  /// Store a response, replacing any existing entry for `key` in `partition`.
  fn put(&self, partition: &str, key: &str, response: &Response) -> Result<(), CacheError>;

  /// Store several responses in one transaction: either all land or none do.
  fn put_all(&self, partition: &str, entries: &[(String, Response)]) -> Result<(), CacheError>;

  /// Look up the response stored for `key` in `partition`.
  fn match_key(&self, partition: &str, key: &str) -> Result<Option<Response>, CacheError>;

  /// Delete a partition and all its entries. Returns whether it existed.
  fn delete_partition(&self, partition: &str) -> Result<bool, CacheError>;

  /// Names of all partitions that currently hold entries.
  fn partitions(&self) -> Result<Vec<String>, CacheError>;

  /// Whether this backend actually caches anything.
  fn is_available(&self) -> bool {
    true
  }
}
