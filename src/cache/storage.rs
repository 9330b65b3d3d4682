//! Response cache implementations.

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

use super::keys::hash_key;
use super::traits::ResponseCache;
use crate::db::schema::RESPONSES_SCHEMA;
use crate::error::CacheError;
use crate::net::Response;

/// Cache used when caching is unavailable - all operations are no-ops.
pub struct NoopResponseCache;

impl ResponseCache for NoopResponseCache {
  fn put(&self, _partition: &str, _key: &str, _response: &Response) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn put_all(&self, _partition: &str, _entries: &[(String, Response)]) -> Result<(), CacheError> {
    Ok(()) // Discard
  }

  fn match_key(&self, _partition: &str, _key: &str) -> Result<Option<Response>, CacheError> {
    Ok(None) // Always miss
  }

  fn delete_partition(&self, _partition: &str) -> Result<bool, CacheError> {
    Ok(false)
  }

  fn partitions(&self) -> Result<Vec<String>, CacheError> {
    Ok(Vec::new())
  }

  fn is_available(&self) -> bool {
    false
  }
}

/// SQLite-based response cache.
pub struct SqliteResponseCache {
  conn: Mutex<Connection>,
}

impl SqliteResponseCache {
  pub fn new(conn: Connection) -> Result<Self, CacheError> {
    conn.execute_batch(RESPONSES_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
    self.conn.lock().map_err(|_| CacheError::LockPoisoned)
  }
}

const UPSERT: &str = "INSERT OR REPLACE INTO responses
  (partition, key_hash, request_key, status, url, headers, body, stored_at)
  VALUES (?, ?, ?, ?, ?, ?, ?, datetime('now'))";

fn upsert(conn: &Connection, partition: &str, key: &str, response: &Response) -> Result<(), CacheError> {
  let headers = serde_json::to_string(&response.headers)
    .map_err(|e| CacheError::Unavailable(format!("unserializable headers: {}", e)))?;
  conn.execute(
    UPSERT,
    params![
      partition,
      hash_key(key),
      key,
      response.status,
      response.url,
      headers,
      response.body
    ],
  )?;
  Ok(())
}

impl ResponseCache for SqliteResponseCache {
  fn put(&self, partition: &str, key: &str, response: &Response) -> Result<(), CacheError> {
    let conn = self.lock()?;
    upsert(&conn, partition, key, response)
  }

  fn put_all(&self, partition: &str, entries: &[(String, Response)]) -> Result<(), CacheError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    for (key, response) in entries {
      upsert(&tx, partition, key, response)?;
    }
    tx.commit()?;
    Ok(())
  }

  fn match_key(&self, partition: &str, key: &str) -> Result<Option<Response>, CacheError> {
    let conn = self.lock()?;

    let row: Option<(u16, String, String, Vec<u8>)> = conn
      .query_row(
        "SELECT status, url, headers, body FROM responses
         WHERE partition = ? AND key_hash = ?",
        params![partition, hash_key(key)],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()?;

    Ok(row.map(|(status, url, headers, body)| Response {
      status,
      url,
      headers: serde_json::from_str(&headers).unwrap_or_default(),
      body,
    }))
  }

  fn delete_partition(&self, partition: &str) -> Result<bool, CacheError> {
    let conn = self.lock()?;
    let deleted = conn.execute("DELETE FROM responses WHERE partition = ?", params![partition])?;
    Ok(deleted > 0)
  }

  fn partitions(&self) -> Result<Vec<String>, CacheError> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare("SELECT DISTINCT partition FROM responses ORDER BY partition")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{DATA_PARTITION, STATIC_PARTITION};

  fn memory_cache() -> SqliteResponseCache {
    SqliteResponseCache::new(Connection::open_in_memory().unwrap()).unwrap()
  }

  #[test]
  fn test_put_then_match() {
    let cache = memory_cache();
    let mut response = Response::new(200, "https://a/x", b"hello".to_vec());
    response.headers.push(("content-type".to_string(), "text/plain".to_string()));

    cache.put(DATA_PARTITION, "https://a/x", &response).unwrap();
    assert_eq!(
      cache.match_key(DATA_PARTITION, "https://a/x").unwrap(),
      Some(response)
    );
  }

  #[test]
  fn test_put_overwrites_same_key() {
    let cache = memory_cache();
    cache
      .put(DATA_PARTITION, "k", &Response::new(200, "u", "old"))
      .unwrap();
    cache
      .put(DATA_PARTITION, "k", &Response::new(200, "u", "new"))
      .unwrap();

    let hit = cache.match_key(DATA_PARTITION, "k").unwrap().unwrap();
    assert_eq!(hit.body, b"new");
  }

  #[test]
  fn test_partitions_are_isolated() {
    let cache = memory_cache();
    cache
      .put(STATIC_PARTITION, "k", &Response::new(200, "u", "static"))
      .unwrap();
    assert!(cache.match_key(DATA_PARTITION, "k").unwrap().is_none());
  }

  #[test]
  fn test_delete_partition_only_touches_that_partition() {
    let cache = memory_cache();
    cache
      .put(STATIC_PARTITION, "a", &Response::new(200, "u", "1"))
      .unwrap();
    cache
      .put(DATA_PARTITION, "b", &Response::new(200, "u", "2"))
      .unwrap();

    assert!(cache.delete_partition(DATA_PARTITION).unwrap());
    assert!(!cache.delete_partition(DATA_PARTITION).unwrap());
    assert_eq!(cache.partitions().unwrap(), vec![STATIC_PARTITION.to_string()]);
    assert!(cache.match_key(STATIC_PARTITION, "a").unwrap().is_some());
  }

  #[test]
  fn test_put_all_writes_every_entry() {
    let cache = memory_cache();
    let entries = vec![
      ("a".to_string(), Response::new(200, "u", "1")),
      ("b".to_string(), Response::new(200, "u", "2")),
    ];
    cache.put_all(STATIC_PARTITION, &entries).unwrap();
    assert!(cache.match_key(STATIC_PARTITION, "a").unwrap().is_some());
    assert!(cache.match_key(STATIC_PARTITION, "b").unwrap().is_some());
  }
}
