use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::utils::{backend_color, connectivity_color};
use crate::sync::{StatusReport, SyncPhase};

/// Transient feedback from the last action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
  Info(String),
  Error(String),
}

/// Draw the status bar. A pending notice replaces the sync summary.
pub fn draw_footer(frame: &mut Frame, area: Rect, report: &StatusReport, notice: Option<&Notice>) {
  let line = match notice {
    Some(Notice::Info(text)) => Line::from(Span::styled(
      format!(" {}", text),
      Style::default().fg(Color::Cyan),
    )),
    Some(Notice::Error(text)) => Line::from(Span::styled(
      format!(" {}", text),
      Style::default().fg(Color::Red),
    )),
    None => summary(report),
  };

  frame.render_widget(Paragraph::new(line), area);
}

fn summary(report: &StatusReport) -> Line<'static> {
  let dim = Style::default().fg(Color::DarkGray);
  let last_sync = match report.last_sync {
    Some(at) => format!(
      "updated {}",
      at.with_timezone(&chrono::Local).format("%H:%M:%S")
    ),
    None => "never synced".to_string(),
  };

  let mut spans = vec![
    Span::styled(
      format!(" {}", report.connectivity),
      Style::default().fg(connectivity_color(report.connectivity)),
    ),
    Span::styled(format!(" │ {} items │ store: ", report.items), dim),
    Span::styled(
      report.store.to_string(),
      Style::default().fg(backend_color(report.store)),
    ),
    Span::styled(" │ cache: ", dim),
    Span::styled(
      report.cache.to_string(),
      Style::default().fg(backend_color(report.cache)),
    ),
    Span::styled(format!(" │ {}", last_sync), dim),
  ];

  match report.phase {
    SyncPhase::Loading => spans.push(Span::styled(" │ syncing...", Style::default().fg(Color::Yellow))),
    SyncPhase::FallbackLoaded => {
      spans.push(Span::styled(" │ showing saved data", Style::default().fg(Color::Yellow)))
    }
    SyncPhase::Failed => spans.push(Span::styled(" │ no data available", Style::default().fg(Color::Red))),
    SyncPhase::Idle | SyncPhase::Success => {}
  }

  Line::from(spans)
}
