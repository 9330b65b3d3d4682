//! Display-side filtering of a collection snapshot.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::Item;

/// Completion status filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
  #[default]
  All,
  Completed,
  Pending,
}

impl StatusFilter {
  pub fn matches(self, item: &Item) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Completed => item.completed,
      StatusFilter::Pending => !item.completed,
    }
  }

  /// Next filter in the All → Completed → Pending cycle.
  pub fn cycle(self) -> Self {
    match self {
      StatusFilter::All => StatusFilter::Completed,
      StatusFilter::Completed => StatusFilter::Pending,
      StatusFilter::Pending => StatusFilter::All,
    }
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      StatusFilter::All => "all",
      StatusFilter::Completed => "completed",
      StatusFilter::Pending => "pending",
    };
    f.write_str(s)
  }
}

impl FromStr for StatusFilter {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "all" => Ok(StatusFilter::All),
      "completed" | "done" => Ok(StatusFilter::Completed),
      "pending" | "open" => Ok(StatusFilter::Pending),
      other => Err(format!("unknown status filter '{}'", other)),
    }
  }
}

/// Search term plus status filter, applied to a snapshot before display.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
  pub search: String,
  pub status: StatusFilter,
}

impl ItemFilter {
  pub fn matches(&self, item: &Item) -> bool {
    let needle = self.search.to_lowercase();
    item.title.to_lowercase().contains(&needle) && self.status.matches(item)
  }

  pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
    items.iter().filter(|item| self.matches(item)).collect()
  }
}
