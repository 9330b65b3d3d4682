//! Durable persistence for the item collection.
//!
//! The store is a cache, not the source of truth: when no durable backend is
//! available the engine runs on [`NoopStore`] and every operation succeeds
//! with no effect.

mod sqlite;

use crate::error::StoreError;
use crate::items::Item;

pub use sqlite::SqliteStore;

/// Key-value persistence of the collection, keyed by item id.
pub trait DurableStore: Send + Sync {
  /// Atomically replace the whole collection. On error nothing is committed.
  fn replace_all(&self, items: &[Item]) -> Result<(), StoreError>;

  /// Current contents in stored collection order. Empty if the store is
  /// absent or empty.
  fn load_all(&self) -> Result<Vec<Item>, StoreError>;

  /// Delete the entire store.
  fn drop_all(&self) -> Result<(), StoreError>;

  /// Whether this backend actually persists anything.
  fn is_available(&self) -> bool {
    true
  }
}

/// Store used when durable storage is unavailable - all operations are no-ops.
pub struct NoopStore;

impl DurableStore for NoopStore {
  fn replace_all(&self, _items: &[Item]) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  fn load_all(&self) -> Result<Vec<Item>, StoreError> {
    Ok(Vec::new()) // Always empty
  }

  fn drop_all(&self) -> Result<(), StoreError> {
    Ok(())
  }

  fn is_available(&self) -> bool {
    false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_noop_store_degrades_silently() {
    let store = NoopStore;
    let item = crate::items::ItemDraft::new("x").into_item(1, None);
    assert!(store.replace_all(&[item]).is_ok());
    assert!(store.load_all().unwrap().is_empty());
    assert!(store.drop_all().is_ok());
    assert!(!store.is_available());
  }
}
