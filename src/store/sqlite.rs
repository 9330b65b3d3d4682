use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use super::DurableStore;
use crate::db::schema::ITEMS_SCHEMA;
use crate::error::StoreError;
use crate::items::Item;

/// SQLite-backed durable store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  pub fn new(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(ITEMS_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

fn table_exists(conn: &Connection) -> Result<bool, StoreError> {
  let found: Option<i64> = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'items'",
      [],
      |row| row.get(0),
    )
    .optional()?;
  Ok(found.is_some())
}

impl DurableStore for SqliteStore {
  fn replace_all(&self, items: &[Item]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;

    // Rolled back on drop unless committed
    let tx = conn.transaction()?;

    // The table may have been dropped by a cache clear
    tx.execute_batch(ITEMS_SCHEMA)?;
    tx.execute("DELETE FROM items", [])?;

    {
      let mut stmt = tx.prepare("INSERT OR REPLACE INTO items (id, position, data) VALUES (?, ?, ?)")?;
      for (position, item) in items.iter().enumerate() {
        let data = serde_json::to_vec(item)?;
        stmt.execute(params![item.id, position as i64, data])?;
      }
    }

    tx.commit()?;
    debug!(count = items.len(), "replaced durable store contents");
    Ok(())
  }

  fn load_all(&self) -> Result<Vec<Item>, StoreError> {
    let conn = self.lock()?;

    if !table_exists(&conn)? {
      return Ok(Vec::new());
    }

    let mut stmt = conn.prepare("SELECT id, data FROM items ORDER BY position, id")?;
    let rows = stmt.query_map([], |row| {
      let id: i64 = row.get(0)?;
      let data: Vec<u8> = row.get(1)?;
      Ok((id, data))
    })?;

    let mut items = Vec::new();
    for row in rows {
      let (id, data) = row?;
      match serde_json::from_slice::<Item>(&data) {
        Ok(item) => items.push(item),
        Err(e) => warn!(id, error = %e, "skipping undecodable stored item"),
      }
    }

    Ok(items)
  }

  fn drop_all(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn.execute_batch("DROP TABLE IF EXISTS items")?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::items::ItemDraft;
  use tempfile::TempDir;

  fn memory_store() -> SqliteStore {
    SqliteStore::new(Connection::open_in_memory().unwrap()).unwrap()
  }

  fn item(id: i64, title: &str) -> Item {
    Item {
      id,
      title: title.to_string(),
      completed: id % 2 == 0,
      user_id: Some(1),
      description: None,
      timestamp: None,
    }
  }

  #[test]
  fn test_replace_then_load_round_trips() {
    let store = memory_store();
    let items = vec![item(3, "c"), item(1, "a"), item(2, "b")];
    store.replace_all(&items).unwrap();
    assert_eq!(store.load_all().unwrap(), items);
  }

  #[test]
  fn test_replace_with_empty_sequence() {
    let store = memory_store();
    store.replace_all(&[item(1, "a")]).unwrap();
    store.replace_all(&[]).unwrap();
    assert!(store.load_all().unwrap().is_empty());
  }

  #[test]
  fn test_replace_discards_previous_contents() {
    let store = memory_store();
    store.replace_all(&[item(1, "a"), item(2, "b")]).unwrap();
    store.replace_all(&[item(5, "e")]).unwrap();
    assert_eq!(store.load_all().unwrap(), vec![item(5, "e")]);
  }

  #[test]
  fn test_optional_fields_survive() {
    let store = memory_store();
    let local = ItemDraft {
      title: "Buy milk".to_string(),
      description: Some("2 litres".to_string()),
      completed: false,
    }
    .into_item(1_700_000_000_000, Some(1));
    store.replace_all(std::slice::from_ref(&local)).unwrap();
    assert_eq!(store.load_all().unwrap(), vec![local]);
  }

  #[test]
  fn test_drop_then_load_is_empty_and_store_recovers() {
    let store = memory_store();
    store.replace_all(&[item(1, "a")]).unwrap();
    store.drop_all().unwrap();
    assert!(store.load_all().unwrap().is_empty());

    // Dropping twice is harmless
    store.drop_all().unwrap();

    store.replace_all(&[item(2, "b")]).unwrap();
    assert_eq!(store.load_all().unwrap(), vec![item(2, "b")]);
  }

  #[test]
  fn test_contents_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("offsync.db");
    let items = vec![item(10, "x"), item(11, "y")];

    {
      let store = SqliteStore::new(crate::db::connect(&path).unwrap()).unwrap();
      store.replace_all(&items).unwrap();
    }

    let reopened = SqliteStore::new(crate::db::connect(&path).unwrap()).unwrap();
    assert_eq!(reopened.load_all().unwrap(), items);
  }
}
