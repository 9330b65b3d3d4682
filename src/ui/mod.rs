pub mod components;
pub mod renderfns;

use crate::app::App;
use crate::items::Item;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Item list
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let engine = app.engine();
  renderfns::draw_header(
    frame,
    chunks[0],
    app.api_url(),
    engine.connectivity().current_state(),
    app.filter().status,
  );

  let visible = app.visible_items();
  draw_item_list(frame, chunks[1], app, &visible);
  renderfns::draw_footer(frame, chunks[2], &engine.status(), app.notice());

  // Overlays render on top of the list
  app.command().render_overlay(frame, chunks[1]);
  app.search().render_overlay(frame, chunks[1], visible.len());
  app.add_prompt().render_overlay(frame, chunks[1]);
}

fn draw_item_list(frame: &mut Frame, area: Rect, app: &App, items: &[&Item]) {
  let filter = app.filter();
  let mut title = format!(" Items ({}/{}) ", items.len(), app.total_items());
  if !filter.search.is_empty() {
    title.push_str(&format!("[/{}] ", filter.search));
  }

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray))
    .title(Span::styled(title, Style::default().fg(Color::Cyan).bold()));

  if items.is_empty() {
    let hint = if app.total_items() == 0 {
      "No items yet. Press r to refresh or a to add one."
    } else {
      "Nothing matches the current filter."
    };
    let paragraph = Paragraph::new(hint)
      .style(Style::default().fg(Color::DarkGray))
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  let title_width = area.width.saturating_sub(30) as usize;
  let rows: Vec<ListItem> = items
    .iter()
    .map(|item| {
      let (mark, color) = if item.completed {
        ("[x]", Color::Green)
      } else {
        ("[ ]", Color::White)
      };
      ListItem::new(Line::from(vec![
        Span::styled(format!(" {} ", mark), Style::default().fg(color)),
        Span::styled(
          format!("{:<width$}", renderfns::truncate(&item.title, title_width), width = title_width),
          Style::default().fg(color),
        ),
        Span::styled(format!(" #{}", item.id), Style::default().fg(Color::DarkGray)),
      ]))
    })
    .collect();

  let list = List::new(rows)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold());
  let mut state = ListState::default();
  state.select(Some(app.selected()));
  frame.render_stateful_widget(list, area, &mut state);
}
