pub mod schema;

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Open (or create) the database file shared by the item store and the
/// response cache.
///
/// Each caller gets its own connection; SQLite's file locking keeps the two
/// execution contexts from corrupting each other.
pub fn connect(path: &Path) -> Result<Connection> {
  // Ensure parent directory exists
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
  }

  let conn = Connection::open(path)
    .map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))?;

  conn
    .busy_timeout(Duration::from_secs(5))
    .map_err(|e| eyre!("Failed to set busy timeout: {}", e))?;
  conn
    .pragma_update(None, "journal_mode", "WAL")
    .map_err(|e| eyre!("Failed to enable WAL: {}", e))?;

  Ok(conn)
}

/// Get the default database path
pub fn default_path() -> Result<PathBuf> {
  Ok(data_dir()?.join("offsync.db"))
}

/// Per-user data directory for offsync (database, log file)
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("offsync"))
}
