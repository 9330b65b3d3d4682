//! Process-wide online/offline state.
//!
//! [`ConnectivityMonitor`] is the single writer-side handle: the platform
//! signal (here, [`spawn_probe`]) or a manual override calls
//! [`ConnectivityMonitor::set_state`], and readers either ask for the
//! current state or subscribe to transitions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
  Online,
  Offline,
}

impl fmt::Display for ConnectivityState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConnectivityState::Online => f.write_str("online"),
      ConnectivityState::Offline => f.write_str("offline"),
    }
  }
}

/// Tracks the current connectivity state and notifies subscribers on change.
#[derive(Debug)]
pub struct ConnectivityMonitor {
  tx: watch::Sender<ConnectivityState>,
  /// Set while a manual override is in force; probe results are ignored
  pinned: AtomicBool,
}

impl ConnectivityMonitor {
  pub fn new(initial: ConnectivityState) -> Self {
    let (tx, _rx) = watch::channel(initial);
    Self {
      tx,
      pinned: AtomicBool::new(false),
    }
  }

  pub fn current_state(&self) -> ConnectivityState {
    *self.tx.borrow()
  }

  pub fn is_online(&self) -> bool {
    self.current_state() == ConnectivityState::Online
  }

  /// Record a platform signal. Returns true if this was a transition;
  /// subscribers are only woken on transitions.
  pub fn set_state(&self, state: ConnectivityState) -> bool {
    let changed = self.tx.send_if_modified(|current| {
      if *current == state {
        false
      } else {
        *current = state;
        true
      }
    });
    if changed {
      info!(%state, "connectivity changed");
    }
    changed
  }

  /// Force a state until [`ConnectivityMonitor::release`] is called.
  pub fn pin(&self, state: ConnectivityState) -> bool {
    self.pinned.store(true, Ordering::SeqCst);
    self.set_state(state)
  }

  /// Hand control back to the probe.
  pub fn release(&self) {
    self.pinned.store(false, Ordering::SeqCst);
  }

  pub fn is_pinned(&self) -> bool {
    self.pinned.load(Ordering::SeqCst)
  }

  /// Record a probe result unless a manual override is in force.
  pub fn report(&self, state: ConnectivityState) -> bool {
    if self.is_pinned() {
      return false;
    }
    self.set_state(state)
  }

  /// Receiver that observes every transition from now on.
  pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
    self.tx.subscribe()
  }
}

/// Handle to the background reachability probe.
pub struct ProbeHandle {
  shutdown_tx: mpsc::Sender<()>,
  task: JoinHandle<()>,
}

impl ProbeHandle {
  /// Stop the probe and wait for it to exit.
  pub async fn shutdown(self) {
    let _ = self.shutdown_tx.send(()).await;
    let _ = self.task.await;
  }
}

/// Resolve `host:port` for a URL, defaulting the port from the scheme.
fn probe_target(url: &Url) -> Option<String> {
  let host = url.host_str()?;
  let port = url.port_or_known_default()?;
  Some(format!("{}:{}", host, port))
}

/// Periodically try a TCP connection to the API host and feed the result
/// into the monitor. This stands in for the platform's online/offline events.
pub fn spawn_probe(
  monitor: Arc<ConnectivityMonitor>,
  target: &Url,
  interval: Duration,
  timeout: Duration,
) -> Option<ProbeHandle> {
  let addr = probe_target(target)?;
  let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

  let task = tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    loop {
      tokio::select! {
        _ = ticker.tick() => {
          let reachable = matches!(
            tokio::time::timeout(timeout, TcpStream::connect(&addr)).await,
            Ok(Ok(_))
          );
          debug!(%addr, reachable, "connectivity probe");
          monitor.report(if reachable {
            ConnectivityState::Online
          } else {
            ConnectivityState::Offline
          });
        }
        _ = shutdown_rx.recv() => {
          break;
        }
      }
    }
  });

  Some(ProbeHandle { shutdown_tx, task })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_state_reports_transitions_only() {
    let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
    assert!(!monitor.set_state(ConnectivityState::Online));
    assert!(monitor.set_state(ConnectivityState::Offline));
    assert_eq!(monitor.current_state(), ConnectivityState::Offline);
    assert!(!monitor.is_online());
  }

  #[test]
  fn test_pinned_state_ignores_probe_reports() {
    let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
    assert!(monitor.pin(ConnectivityState::Offline));
    assert!(!monitor.report(ConnectivityState::Online));
    assert_eq!(monitor.current_state(), ConnectivityState::Offline);

    monitor.release();
    assert!(monitor.report(ConnectivityState::Online));
    assert!(monitor.is_online());
  }

  #[tokio::test]
  async fn test_subscribers_see_transitions() {
    let monitor = ConnectivityMonitor::new(ConnectivityState::Offline);
    let mut rx = monitor.subscribe();

    monitor.set_state(ConnectivityState::Online);
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), ConnectivityState::Online);
  }

  #[tokio::test]
  async fn test_repeated_signal_does_not_wake_subscribers() {
    let monitor = ConnectivityMonitor::new(ConnectivityState::Online);
    let rx = monitor.subscribe();
    monitor.set_state(ConnectivityState::Online);
    assert!(!rx.has_changed().unwrap());
  }

  #[test]
  fn test_probe_target_uses_scheme_default_port() {
    let url = Url::parse("https://jsonplaceholder.typicode.com/todos").unwrap();
    assert_eq!(
      probe_target(&url).as_deref(),
      Some("jsonplaceholder.typicode.com:443")
    );
    let url = Url::parse("http://localhost:8080/x").unwrap();
    assert_eq!(probe_target(&url).as_deref(), Some("localhost:8080"));
  }

  #[tokio::test]
  async fn test_probe_marks_unreachable_host_offline() {
    // Bind then drop a listener to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let monitor = Arc::new(ConnectivityMonitor::new(ConnectivityState::Online));
    let mut rx = monitor.subscribe();
    let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    let probe = spawn_probe(
      monitor.clone(),
      &url,
      Duration::from_millis(20),
      Duration::from_millis(200),
    )
    .unwrap();

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(monitor.current_state(), ConnectivityState::Offline);
    probe.shutdown().await;
  }
}
