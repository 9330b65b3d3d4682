use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::utils::connectivity_color;
use crate::connectivity::ConnectivityState;
use crate::items::StatusFilter;

/// Draw the header bar with logo, API host, connectivity and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  api_url: &str,
  connectivity: ConnectivityState,
  status: StatusFilter,
) {
  let domain = extract_domain(api_url);
  let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Cyan));
  let hint = |h: &'static str| Span::styled(h, Style::default().fg(Color::DarkGray));

  let header = Line::from(vec![
    Span::styled(" offsync ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", domain), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" ● {} ", connectivity),
      Style::default().fg(connectivity_color(connectivity)).bold(),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", status), Style::default().fg(Color::Yellow)),
    Span::raw("  "),
    key("<:>"),
    hint(" command "),
    key("</>"),
    hint(" search "),
    key("<f>"),
    hint(" filter "),
    key("<a>"),
    hint(" add "),
    key("<r>"),
    hint(" refresh "),
    key("<q>"),
    hint(" quit"),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Host (and port) part of a URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
