//! Scheduled revalidation tied to the engine's lifetime.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::SyncEngine;
use crate::connectivity::ConnectivityState;

/// Handle for the background revalidation task.
///
/// The task revalidates on a fixed interval (no backoff) and immediately
/// whenever connectivity transitions to online. It runs until
/// [`RevalidationHandle::shutdown`] is called or the handle is dropped.
pub struct RevalidationHandle {
  shutdown_tx: mpsc::Sender<()>,
  task: Option<JoinHandle<()>>,
}

impl RevalidationHandle {
  pub fn spawn(engine: Arc<SyncEngine>, interval: Duration) -> Self {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let mut connectivity = engine.connectivity().subscribe();

    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // Skip the first tick (immediate)
      ticker.tick().await;

      loop {
        tokio::select! {
          _ = ticker.tick() => {
            debug!("periodic revalidation");
            engine.revalidate().await;
          }
          changed = connectivity.changed() => {
            if changed.is_err() {
              break;
            }
            let state = *connectivity.borrow_and_update();
            if state == ConnectivityState::Online {
              info!("back online, revalidating");
              engine.revalidate().await;
            }
          }
          _ = shutdown_rx.recv() => {
            break;
          }
        }
      }
    });

    Self {
      shutdown_tx,
      task: Some(task),
    }
  }

  /// Stop the task and wait for it to exit.
  pub async fn shutdown(mut self) {
    let _ = self.shutdown_tx.send(()).await;
    if let Some(task) = self.task.take() {
      let _ = task.await;
    }
  }
}

impl Drop for RevalidationHandle {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
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
  use serde_json::json;
  use url::Url;

  const LIST_URL: &str = "https://api.test/todos?_limit=10";

  fn engine(
    transport: Arc<FakeTransport>,
    connectivity: Arc<ConnectivityMonitor>,
  ) -> Arc<SyncEngine> {
    Arc::new(SyncEngine::new(
      ItemsApi::new(Url::parse("https://api.test/todos").unwrap(), 10),
      transport,
      Arc::new(NoopStore),
      Arc::new(NoopResponseCache),
      connectivity,
      EngineOptions::default(),
    ))
  }

  #[tokio::test(start_paused = true)]
  async fn test_interval_triggers_revalidation() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond_json(LIST_URL, &json!([{"id": 1, "title": "a", "completed": false}]));
    let connectivity = Arc::new(ConnectivityMonitor::new(ConnectivityState::Online));
    let engine = engine(transport.clone(), connectivity);

    let handle = RevalidationHandle::spawn(engine.clone(), Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(transport.request_count(), 1);
    assert_eq!(engine.items().len(), 1);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.request_count(), 2);

    handle.shutdown().await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_reconnect_triggers_revalidation() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond_json(LIST_URL, &json!([]));
    let connectivity = Arc::new(ConnectivityMonitor::new(ConnectivityState::Offline));
    let engine = engine(transport.clone(), connectivity.clone());

    let handle = RevalidationHandle::spawn(engine, Duration::from_secs(3600));
    tokio::task::yield_now().await;

    connectivity.set_state(ConnectivityState::Online);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.request_count(), 1);

    // Going offline does not trigger anything
    connectivity.set_state(ConnectivityState::Offline);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.request_count(), 1);

    handle.shutdown().await;
  }

  #[tokio::test(start_paused = true)]
  async fn test_shutdown_stops_revalidation() {
    let transport = Arc::new(FakeTransport::new());
    transport.respond_json(LIST_URL, &json!([]));
    let connectivity = Arc::new(ConnectivityMonitor::new(ConnectivityState::Online));
    let engine = engine(transport.clone(), connectivity);

    let handle = RevalidationHandle::spawn(engine, Duration::from_secs(30));
    handle.shutdown().await;

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.request_count(), 0);
  }
}
