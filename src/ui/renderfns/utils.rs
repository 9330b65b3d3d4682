use ratatui::prelude::Color;

use crate::connectivity::ConnectivityState;
use crate::sync::BackendStatus;

/// Truncate to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn connectivity_color(state: ConnectivityState) -> Color {
  match state {
    ConnectivityState::Online => Color::Green,
    ConnectivityState::Offline => Color::Red,
  }
}

/// Color for a store/cache status segment in the status bar
pub fn backend_color(status: BackendStatus) -> Color {
  match status {
    BackendStatus::Saved | BackendStatus::Cached => Color::Green,
    BackendStatus::Available | BackendStatus::Cleared => Color::White,
    BackendStatus::Unsupported => Color::DarkGray,
    BackendStatus::Error => Color::Red,
  }
}
