use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::items::ItemDraft;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddEvent {
  /// Draft ready for validation by the engine
  Submitted(ItemDraft),
  Cancelled,
}

/// New item prompt: a title line plus a completed toggle on Tab
#[derive(Debug, Clone, Default)]
pub struct AddPrompt {
  title: TextInput,
  completed: bool,
  active: bool,
}

impl AddPrompt {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.completed = false;
    self.title.clear();
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<AddEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    if key.code == KeyCode::Tab {
      self.completed = !self.completed;
      return KeyResult::Handled;
    }

    match self.title.handle_key(key) {
      InputResult::Submitted(title) => {
        self.active = false;
        let mut draft = ItemDraft::new(title);
        draft.completed = self.completed;
        KeyResult::Event(AddEvent::Submitted(draft))
      }
      InputResult::Cancelled => {
        self.active = false;
        KeyResult::Event(AddEvent::Cancelled)
      }
      InputResult::Consumed => KeyResult::Handled,
      InputResult::NotHandled => KeyResult::NotHandled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 70 / 100).clamp(30, 72).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 4);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Green))
      .title(" New item ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let check = if self.completed { "[x]" } else { "[ ]" };
    let lines = vec![
      Line::from(vec![
        Span::styled("title: ", Style::default().fg(Color::DarkGray)),
        Span::raw(self.title.value()),
        Span::styled("_", Style::default().fg(Color::Green)),
      ]),
      Line::from(vec![
        Span::styled(check, Style::default().fg(Color::Green)),
        Span::styled(" completed  <tab> toggle", Style::default().fg(Color::DarkGray)),
      ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
  }
}
