use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::ValidationError;

/// A single item in the synced collection. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
  pub id: i64,
  pub title: String,
  #[serde(default)]
  pub completed: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_id: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// ISO-8601 creation time, only present on locally created items
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<String>,
}

/// User input for a new item, before an id is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
  pub title: String,
  pub description: Option<String>,
  pub completed: bool,
}

impl ItemDraft {
  pub fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      ..Self::default()
    }
  }

  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.title.trim().is_empty() {
      return Err(ValidationError::EmptyField("title"));
    }
    Ok(())
  }

  /// Stamp the draft with an id, owner and creation time.
  pub fn into_item(self, id: i64, user_id: Option<i64>) -> Item {
    Item {
      id,
      title: self.title,
      completed: self.completed,
      user_id,
      description: self.description.filter(|d| !d.is_empty()),
      timestamp: Some(Utc::now().to_rfc3339()),
    }
  }
}

/// Clock-based id source for locally created items.
///
/// Ids are epoch milliseconds, bumped forward when two items are created
/// within the same millisecond so that ids stay strictly increasing.
#[derive(Debug, Default)]
pub struct ItemIdGenerator {
  last: AtomicI64,
}

impl ItemIdGenerator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next_id(&self) -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = self.last.load(Ordering::Relaxed);
    loop {
      let candidate = now.max(last + 1);
      match self
        .last
        .compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::Relaxed)
      {
        Ok(_) => return candidate,
        Err(actual) => last = actual,
      }
    }
  }
}
