use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::sync::Arc;

use crate::connectivity::ConnectivityState;
use crate::items::Item;

/// Phase of the most recent load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
  Idle,
  Loading,
  Success,
  FallbackLoaded,
  Failed,
}

/// Terminal state of a single `load()`.
///
/// `FallbackLoaded` is a degraded success, not an error: the collection was
/// served from the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
  Success,
  FallbackLoaded,
  Failed,
}

impl From<LoadOutcome> for SyncPhase {
  fn from(outcome: LoadOutcome) -> Self {
    match outcome {
      LoadOutcome::Success => SyncPhase::Success,
      LoadOutcome::FallbackLoaded => SyncPhase::FallbackLoaded,
      LoadOutcome::Failed => SyncPhase::Failed,
    }
  }
}

/// What the UI shows for the durable store or the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
  /// Backend present, nothing written yet this session
  Available,
  /// No backend on this platform; operations are no-ops
  Unsupported,
  /// Last write-through succeeded
  Saved,
  /// Last read was served from this backend
  Cached,
  /// Wiped by a clear
  Cleared,
  /// Last operation failed (logged and swallowed)
  Error,
}

impl fmt::Display for BackendStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      BackendStatus::Available => "available",
      BackendStatus::Unsupported => "not supported",
      BackendStatus::Saved => "data saved",
      BackendStatus::Cached => "cached data",
      BackendStatus::Cleared => "cleared",
      BackendStatus::Error => "error",
    };
    f.write_str(s)
  }
}

/// The engine's observable state. Published through a watch channel, so
/// every subscriber sees whole snapshots.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub items: Arc<Vec<Item>>,
  pub phase: SyncPhase,
  /// When the network last answered a collection read
  pub last_sync: Option<DateTime<Utc>>,
  pub store: BackendStatus,
  pub cache: BackendStatus,
}

/// One-line status for the UI boundary.
#[derive(Debug, Clone)]
pub struct StatusReport {
  pub connectivity: ConnectivityState,
  pub phase: SyncPhase,
  pub items: usize,
  pub store: BackendStatus,
  pub cache: BackendStatus,
  pub last_sync: Option<DateTime<Utc>>,
}

impl fmt::Display for StatusReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} | {} items | store: {} | cache: {} | ",
      self.connectivity, self.items, self.store, self.cache
    )?;
    match self.last_sync {
      Some(at) => write!(f, "updated {}", at.with_timezone(&Local).format("%H:%M:%S")),
      None => f.write_str("never synced"),
    }
  }
}
