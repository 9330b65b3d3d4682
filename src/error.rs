//! Error taxonomy for the sync core.
//!
//! Only validation errors ever reach a caller unrecovered. Transport errors
//! on reads fall back to the durable store, and store/cache errors are
//! logged and swallowed by the engine and the proxy.

use thiserror::Error;

/// The network was unreachable or answered with a non-2xx status.
#[derive(Debug, Error)]
pub enum TransportError {
  #[error("network unreachable: {0}")]
  Unreachable(String),

  #[error("unexpected HTTP status {0}")]
  Status(u16),

  #[error("failed to decode response body: {0}")]
  Decode(String),
}

impl From<reqwest::Error> for TransportError {
  fn from(e: reqwest::Error) -> Self {
    TransportError::Unreachable(e.to_string())
  }
}

/// A required field was empty on create.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("{0} must not be empty")]
  EmptyField(&'static str),
}

/// The durable store backend is unavailable or a transaction failed.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("durable store transaction failed: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("failed to (de)serialize stored item: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("durable store lock poisoned")]
  LockPoisoned,
}

/// The response cache backend is unavailable or a write failed.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("response cache unavailable: {0}")]
  Unavailable(String),

  #[error("response cache operation failed: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("response cache lock poisoned")]
  LockPoisoned,
}
