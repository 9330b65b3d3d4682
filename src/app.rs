use crate::connectivity::ConnectivityState;
use crate::event::{Event, EventHandler};
use crate::items::{Item, ItemFilter, StatusFilter};
use crate::sync::{LoadOutcome, RevalidationHandle, Snapshot, SyncEngine};
use crate::ui;
use crate::ui::components::{
  AddEvent, AddPrompt, CommandEvent, CommandInput, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::renderfns::footer::Notice;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Main application state
pub struct App {
  engine: Arc<SyncEngine>,

  /// Shown in the header
  api_url: String,

  /// Last snapshot published by the engine
  snapshot: Snapshot,

  /// Search and status filter over the collection
  filter: ItemFilter,

  /// Index into the filtered list
  selected: usize,

  command: CommandInput,
  search: SearchInput,
  add: AddPrompt,

  /// Feedback from the last action, cleared on the next key press
  notice: Option<Notice>,

  /// Event sender for async tasks
  event_tx: Option<mpsc::UnboundedSender<Event>>,

  should_quit: bool,
}

impl App {
  pub fn new(engine: Arc<SyncEngine>, api_url: impl Into<String>) -> Self {
    let snapshot = engine.snapshot();
    Self {
      engine,
      api_url: api_url.into(),
      snapshot,
      filter: ItemFilter::default(),
      selected: 0,
      command: CommandInput::new(),
      search: SearchInput::new(),
      add: AddPrompt::new(),
      notice: None,
      event_tx: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self, revalidate_every: Duration) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = Some(events.sender());
    self.forward_engine_events(events.sender());

    let revalidation = RevalidationHandle::spawn(Arc::clone(&self.engine), revalidate_every);

    // Show saved data right away, then go to the network
    self.engine.hydrate().await;
    self.spawn_load();

    let result = self.event_loop(&mut terminal, &mut events).await;

    revalidation.shutdown().await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }
    Ok(())
  }

  /// Relay snapshot and connectivity changes into the UI event queue
  fn forward_engine_events(&self, tx: mpsc::UnboundedSender<Event>) {
    let mut snapshots = self.engine.subscribe();
    let snapshot_tx = tx.clone();
    tokio::spawn(async move {
      while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        if snapshot_tx.send(Event::Snapshot(snapshot)).is_err() {
          break;
        }
      }
    });

    let mut connectivity = self.engine.connectivity().subscribe();
    tokio::spawn(async move {
      while connectivity.changed().await.is_ok() {
        let state = *connectivity.borrow_and_update();
        if tx.send(Event::Connectivity(state)).is_err() {
          break;
        }
      }
    });
  }

  fn spawn_load(&self) {
    let engine = Arc::clone(&self.engine);
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let outcome = engine.load().await;
      if let Some(tx) = tx {
        let _ = tx.send(Event::Loaded(outcome));
      }
    });
  }

  fn spawn_clear(&self) {
    let engine = Arc::clone(&self.engine);
    tokio::spawn(async move {
      engine.clear().await;
    });
  }

  pub fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Snapshot(snapshot) => {
        self.snapshot = snapshot;
        self.clamp_selection();
      }
      Event::Loaded(outcome) => {
        self.notice = match outcome {
          LoadOutcome::Success => None,
          LoadOutcome::FallbackLoaded => {
            Some(Notice::Info("Network unavailable, showing saved items".to_string()))
          }
          LoadOutcome::Failed => Some(Notice::Error(
            "Network unavailable and nothing saved yet".to_string(),
          )),
        };
      }
      Event::Connectivity(state) => {
        self.notice = Some(Notice::Info(match state {
          ConnectivityState::Online => "Back online".to_string(),
          ConnectivityState::Offline => "Offline, new items stay local".to_string(),
        }));
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Overlays take keys first, in stacking order
    match self.add.handle_key(key) {
      KeyResult::Event(AddEvent::Submitted(draft)) => {
        match self.engine.add_item(draft) {
          Ok(item) => {
            self.selected = 0;
            self.notice = Some(Notice::Info(format!("Added \"{}\"", item.title)));
          }
          Err(e) => self.notice = Some(Notice::Error(e.to_string())),
        }
        return;
      }
      KeyResult::Event(AddEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.filter.search = query;
        self.selected = 0;
        return;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted { name, arg }) => {
        self.execute_command(&name, arg.as_deref());
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) => return,
      KeyResult::Handled => {
        self.notice = None;
        return;
      }
      KeyResult::NotHandled => {}
    }

    if self.search.is_active() || self.command.is_active() || self.add.is_active() {
      return;
    }

    self.notice = None;
    match key.code {
      KeyCode::Char('q') => self.should_quit = true,
      KeyCode::Esc => {
        self.search.clear();
        self.filter.search.clear();
        self.selected = 0;
      }
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Char('g') | KeyCode::Home => self.selected = 0,
      KeyCode::Char('G') | KeyCode::End => {
        self.selected = self.visible_items().len().saturating_sub(1);
      }
      KeyCode::Char('r') => self.execute_command("refresh", None),
      KeyCode::Char('f') => self.execute_command("filter", None),
      KeyCode::Char('a') => self.execute_command("add", None),
      _ => {}
    }
  }

  fn execute_command(&mut self, name: &str, arg: Option<&str>) {
    match name {
      "refresh" => {
        self.notice = Some(Notice::Info("Refreshing...".to_string()));
        self.spawn_load();
      }
      "add" => self.add.activate(),
      "filter" => match arg.map(str::parse::<StatusFilter>) {
        Some(Ok(status)) => self.set_status_filter(status),
        Some(Err(e)) => self.notice = Some(Notice::Error(e)),
        None => self.set_status_filter(self.filter.status.cycle()),
      },
      "online" => {
        let connectivity = self.engine.connectivity();
        connectivity.release();
        connectivity.set_state(ConnectivityState::Online);
        info!("connectivity override released");
      }
      "offline" => {
        self.engine.connectivity().pin(ConnectivityState::Offline);
        info!("connectivity pinned offline");
      }
      "clear" => {
        self.notice = Some(Notice::Info("Cleared cached and stored data".to_string()));
        self.spawn_clear();
      }
      "quit" => self.should_quit = true,
      "" => {}
      other => {
        warn!(command = other, "unknown command");
        self.notice = Some(Notice::Error(format!("Unknown command: {}", other)));
      }
    }
  }

  fn set_status_filter(&mut self, status: StatusFilter) {
    self.filter.status = status;
    self.selected = 0;
    self.notice = Some(Notice::Info(format!("Showing {} items", status)));
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible_items().len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn clamp_selection(&mut self) {
    let len = self.visible_items().len();
    if self.selected >= len {
      self.selected = len.saturating_sub(1);
    }
  }

  // Accessors for UI rendering
  pub fn visible_items(&self) -> Vec<&Item> {
    self.filter.apply(&self.snapshot.items)
  }

  pub fn total_items(&self) -> usize {
    self.snapshot.items.len()
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn filter(&self) -> &ItemFilter {
    &self.filter
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  pub fn engine(&self) -> &SyncEngine {
    &self.engine
  }

  pub fn notice(&self) -> Option<&Notice> {
    self.notice.as_ref()
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn search(&self) -> &SearchInput {
    &self.search
  }

  pub fn add_prompt(&self) -> &AddPrompt {
    &self.add
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::NoopResponseCache;
  use crate::connectivity::ConnectivityMonitor;
  use crate::items::ItemsApi;
  use crate::net::fake::FakeTransport;
  use crate::store::NoopStore;
  use crate::sync::EngineOptions;
  use url::Url;

  fn app(state: ConnectivityState) -> App {
    let api = ItemsApi::new(Url::parse("https://api.test/todos").unwrap(), 10);
    let engine = Arc::new(SyncEngine::new(
      api,
      Arc::new(FakeTransport::new()),
      Arc::new(NoopStore),
      Arc::new(NoopResponseCache),
      Arc::new(ConnectivityMonitor::new(state)),
      EngineOptions { user_id: Some(1) },
    ));
    App::new(engine, "https://api.test/todos")
  }

  fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
  }

  fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      app.handle_event(key(KeyCode::Char(c)));
    }
  }

  fn sync_snapshot(app: &mut App) {
    let snapshot = app.engine.snapshot();
    app.handle_event(Event::Snapshot(snapshot));
  }

  #[tokio::test]
  async fn test_add_prompt_prepends_item() {
    let mut app = app(ConnectivityState::Offline);
    app.handle_event(key(KeyCode::Char('a')));
    assert!(app.add_prompt().is_active());

    type_text(&mut app, "first");
    app.handle_event(key(KeyCode::Enter));
    app.handle_event(key(KeyCode::Char('a')));
    type_text(&mut app, "second");
    app.handle_event(key(KeyCode::Enter));
    sync_snapshot(&mut app);

    let titles: Vec<_> = app.visible_items().iter().map(|i| i.title.clone()).collect();
    assert_eq!(titles, vec!["second", "first"]);
    app.engine.flush().await;
  }

  #[tokio::test]
  async fn test_empty_title_reports_validation_error() {
    let mut app = app(ConnectivityState::Offline);
    app.handle_event(key(KeyCode::Char('a')));
    app.handle_event(key(KeyCode::Enter));

    assert_eq!(
      app.notice(),
      Some(&Notice::Error("title must not be empty".to_string()))
    );
    assert_eq!(app.engine.items().len(), 0);
  }

  #[tokio::test]
  async fn test_search_and_status_filter_narrow_the_list() {
    let mut app = app(ConnectivityState::Offline);
    for title in ["buy milk", "walk dog", "buy bread"] {
      app.handle_event(key(KeyCode::Char('a')));
      type_text(&mut app, title);
      app.handle_event(key(KeyCode::Enter));
    }
    sync_snapshot(&mut app);

    app.handle_event(key(KeyCode::Char('/')));
    type_text(&mut app, "buy");
    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.visible_items().len(), 2);

    // All -> Completed: nothing created here is completed
    app.handle_event(key(KeyCode::Char('f')));
    assert_eq!(app.filter().status, StatusFilter::Completed);
    assert!(app.visible_items().is_empty());

    app.handle_event(key(KeyCode::Esc));
    app.handle_event(key(KeyCode::Char(':')));
    type_text(&mut app, "filter all");
    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.visible_items().len(), 3);
    app.engine.flush().await;
  }

  #[tokio::test]
  async fn test_offline_command_pins_connectivity() {
    let mut app = app(ConnectivityState::Online);
    app.handle_event(key(KeyCode::Char(':')));
    type_text(&mut app, "offline");
    app.handle_event(key(KeyCode::Enter));

    let connectivity = app.engine.connectivity();
    assert!(!connectivity.is_online());
    assert!(connectivity.is_pinned());

    app.handle_event(key(KeyCode::Char(':')));
    type_text(&mut app, "online");
    app.handle_event(key(KeyCode::Enter));
    assert!(app.engine.connectivity().is_online());
    assert!(!app.engine.connectivity().is_pinned());
  }

  #[tokio::test]
  async fn test_unknown_command_sets_error_notice() {
    let mut app = app(ConnectivityState::Offline);
    app.handle_event(key(KeyCode::Char(':')));
    type_text(&mut app, "zzz");
    app.handle_event(key(KeyCode::Enter));
    assert_eq!(
      app.notice(),
      Some(&Notice::Error("Unknown command: zzz".to_string()))
    );
  }

  #[tokio::test]
  async fn test_selection_wraps_and_clamps() {
    let mut app = app(ConnectivityState::Offline);
    for title in ["a", "b"] {
      app.handle_event(key(KeyCode::Char('a')));
      type_text(&mut app, title);
      app.handle_event(key(KeyCode::Enter));
    }
    sync_snapshot(&mut app);

    app.handle_event(key(KeyCode::Char('k')));
    assert_eq!(app.selected(), 1);
    app.handle_event(key(KeyCode::Char('j')));
    assert_eq!(app.selected(), 0);

    app.handle_event(key(KeyCode::Char('G')));
    app.engine.clear().await;
    sync_snapshot(&mut app);
    assert_eq!(app.selected(), 0);
  }

  #[test]
  fn test_q_quits() {
    let mut app = app(ConnectivityState::Offline);
    app.handle_event(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[test]
  fn test_fallback_outcome_sets_notice() {
    let mut app = app(ConnectivityState::Offline);
    app.handle_event(Event::Loaded(LoadOutcome::FallbackLoaded));
    assert!(matches!(app.notice(), Some(Notice::Info(_))));
  }
}
