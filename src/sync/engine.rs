//! The sync engine owns the in-memory collection and decides, per load,
//! whether the truth comes from the network or from the durable store.

use chrono::Utc;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::status::{BackendStatus, LoadOutcome, Snapshot, StatusReport, SyncPhase};
use crate::cache::{ResponseCache, DATA_PARTITION};
use crate::connectivity::ConnectivityMonitor;
use crate::error::{StoreError, TransportError, ValidationError};
use crate::items::{Item, ItemDraft, ItemIdGenerator, ItemsApi};
use crate::net::{Response, Transport};
use crate::store::DurableStore;

/// Tunables that don't belong to any collaborator.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
  /// Owner stamped on locally created items
  pub user_id: Option<i64>,
}

/// A successful remote read, ready to be committed.
struct RemoteRead {
  cache_key: String,
  response: Response,
  items: Vec<Item>,
}

/// Orchestrates loads, local creation, revalidation and clearing.
///
/// Shared as `Arc<SyncEngine>`. Loads, revalidations, persistence of local
/// edits and clears are serialised through one single-flight lock, so a slow
/// response can never overwrite a newer commit.
pub struct SyncEngine {
  api: ItemsApi,
  transport: Arc<dyn Transport>,
  store: Arc<dyn DurableStore>,
  cache: Arc<dyn ResponseCache>,
  connectivity: Arc<ConnectivityMonitor>,
  options: EngineOptions,
  ids: ItemIdGenerator,
  snapshot: watch::Sender<Snapshot>,
  flight: Mutex<()>,
  outbound: StdMutex<Vec<JoinHandle<()>>>,
}

impl SyncEngine {
  pub fn new(
    api: ItemsApi,
    transport: Arc<dyn Transport>,
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn ResponseCache>,
    connectivity: Arc<ConnectivityMonitor>,
    options: EngineOptions,
  ) -> Self {
    let initial = Snapshot {
      items: Arc::new(Vec::new()),
      phase: SyncPhase::Idle,
      last_sync: None,
      store: availability(store.is_available()),
      cache: availability(cache.is_available()),
    };
    let (snapshot, _rx) = watch::channel(initial);

    Self {
      api,
      transport,
      store,
      cache,
      connectivity,
      options,
      ids: ItemIdGenerator::new(),
      snapshot,
      flight: Mutex::new(()),
      outbound: StdMutex::new(Vec::new()),
    }
  }

  pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
    &self.connectivity
  }

  /// Current snapshot of the collection and sync status.
  pub fn snapshot(&self) -> Snapshot {
    self.snapshot.borrow().clone()
  }

  /// Current collection.
  pub fn items(&self) -> Arc<Vec<Item>> {
    Arc::clone(&self.snapshot.borrow().items)
  }

  /// Receiver notified on every snapshot change.
  pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
    self.snapshot.subscribe()
  }

  pub fn status(&self) -> StatusReport {
    let snapshot = self.snapshot.borrow();
    StatusReport {
      connectivity: self.connectivity.current_state(),
      phase: snapshot.phase,
      items: snapshot.items.len(),
      store: snapshot.store,
      cache: snapshot.cache,
      last_sync: snapshot.last_sync,
    }
  }

  /// Fetch the collection, falling back to the durable store.
  ///
  /// Offline skips the network entirely. On success the durable store is
  /// written, then the response cache, then subscribers are notified.
  pub async fn load(&self) -> LoadOutcome {
    let _flight = self.flight.lock().await;
    self.snapshot.send_modify(|s| s.phase = SyncPhase::Loading);

    match self.fetch_remote().await {
      Ok(read) => {
        info!(count = read.items.len(), "loaded collection from network");
        self.commit_remote(read);
        LoadOutcome::Success
      }
      Err(e) => {
        warn!(error = %e, "remote load failed, falling back to durable store");
        self.fallback()
      }
    }
  }

  /// Re-run the network read and, on success, replace-and-notify.
  ///
  /// Failures leave the current collection untouched. Returns whether the
  /// collection was refreshed.
  pub async fn revalidate(&self) -> bool {
    if !self.connectivity.is_online() {
      debug!("offline, skipping revalidation");
      return false;
    }

    let _flight = self.flight.lock().await;
    match self.fetch_remote().await {
      Ok(read) => {
        info!(count = read.items.len(), "revalidated collection");
        self.commit_remote(read);
        true
      }
      Err(e) => {
        warn!(error = %e, "revalidation failed");
        false
      }
    }
  }

  /// Populate the collection from the durable store without touching the
  /// network.
  pub async fn hydrate(&self) -> usize {
    let _flight = self.flight.lock().await;
    let items = self.read_store();
    let count = items.len();
    self.snapshot.send_modify(|s| {
      if count > 0 {
        s.store = BackendStatus::Cached;
      }
      s.items = Arc::new(items);
    });
    count
  }

  /// Create an item locally and make it the first element of the
  /// collection immediately.
  ///
  /// The remote create is a best-effort background task: at most once, no
  /// retry, failure only logged, never rolled back. Afterwards the current
  /// collection is persisted whatever the network outcome was.
  pub fn add_item(self: &Arc<Self>, draft: ItemDraft) -> Result<Item, ValidationError> {
    draft.validate()?;

    let item = draft.into_item(self.ids.next_id(), self.options.user_id);
    self.snapshot.send_modify(|s| {
      let mut items = Vec::with_capacity(s.items.len() + 1);
      items.push(item.clone());
      items.extend(s.items.iter().filter(|i| i.id != item.id).cloned());
      s.items = Arc::new(items);
    });
    debug!(id = item.id, "prepended local item");

    let engine = Arc::clone(self);
    let submitted = item.clone();
    let task = tokio::spawn(async move {
      engine.submit(submitted).await;
      engine.persist_current().await;
    });

    let mut outbound = self.outbound.lock().unwrap_or_else(|e| e.into_inner());
    outbound.retain(|handle| !handle.is_finished());
    outbound.push(task);

    Ok(item)
  }

  /// Wait for every pending best-effort submission to finish.
  pub async fn flush(&self) {
    let pending = {
      let mut outbound = self.outbound.lock().unwrap_or_else(|e| e.into_inner());
      std::mem::take(&mut *outbound)
    };
    for handle in pending {
      if let Err(e) = handle.await {
        warn!(error = %e, "outbound submission task failed");
      }
    }
  }

  /// Delete the data partition and the durable store, then empty the
  /// collection. Destructive; confirmation is the caller's business.
  pub async fn clear(&self) {
    let _flight = self.flight.lock().await;

    let cache = match self.cache.delete_partition(DATA_PARTITION) {
      Ok(_) => self.cleared_or_unsupported(self.cache.is_available()),
      Err(e) => {
        warn!(error = %e, "failed to delete data partition");
        BackendStatus::Error
      }
    };
    let store = match self.store.drop_all() {
      Ok(()) => self.cleared_or_unsupported(self.store.is_available()),
      Err(e) => {
        warn!(error = %e, "failed to drop durable store");
        BackendStatus::Error
      }
    };

    self.snapshot.send_modify(|s| {
      s.items = Arc::new(Vec::new());
      s.phase = SyncPhase::Idle;
      s.last_sync = None;
      s.store = store;
      s.cache = cache;
    });
    info!("cleared local data");
  }

  async fn fetch_remote(&self) -> Result<RemoteRead, TransportError> {
    if !self.connectivity.is_online() {
      return Err(TransportError::Unreachable("offline".to_string()));
    }

    let request = self.api.list_request();
    let cache_key = request.cache_key();
    let response = self.transport.send(request).await?;
    let items = dedupe_by_id(ItemsApi::parse_list(&response)?);

    Ok(RemoteRead {
      cache_key,
      response,
      items,
    })
  }

  /// Write-through a successful read: durable store, then response cache,
  /// then notify. Store and cache failures are logged and swallowed.
  ///
  /// `last_sync` records the last successful remote read and nothing else.
  fn commit_remote(&self, read: RemoteRead) {
    let store = self.record_store_write(self.store.replace_all(&read.items));

    let cache = match self.cache.put(DATA_PARTITION, &read.cache_key, &read.response) {
      Ok(()) => saved_or_unsupported(self.cache.is_available()),
      Err(e) => {
        warn!(error = %e, "failed to cache collection response");
        BackendStatus::Error
      }
    };

    let now = Utc::now();
    self.snapshot.send_modify(|s| {
      s.items = Arc::new(read.items);
      s.phase = SyncPhase::Success;
      s.last_sync = Some(now);
      s.store = store;
      s.cache = cache;
    });
  }

  fn fallback(&self) -> LoadOutcome {
    let items = self.read_store();
    let outcome = if items.is_empty() {
      LoadOutcome::Failed
    } else {
      LoadOutcome::FallbackLoaded
    };
    info!(count = items.len(), ?outcome, "served collection from durable store");

    self.snapshot.send_modify(|s| {
      if outcome == LoadOutcome::FallbackLoaded {
        s.store = BackendStatus::Cached;
      }
      s.items = Arc::new(items);
      s.phase = outcome.into();
    });
    outcome
  }

  fn read_store(&self) -> Vec<Item> {
    match self.store.load_all() {
      Ok(items) => dedupe_by_id(items),
      Err(e) => {
        warn!(error = %e, "failed to read durable store");
        Vec::new()
      }
    }
  }

  async fn submit(&self, item: Item) {
    if !self.connectivity.is_online() {
      info!(id = item.id, "offline, item kept locally only");
      return;
    }

    let request = match self.api.create_request(&item) {
      Ok(request) => request,
      Err(e) => {
        warn!(id = item.id, error = %e, "failed to encode item");
        return;
      }
    };

    match self.transport.send(request).await {
      Ok(response) if response.is_success() => {
        info!(id = item.id, status = response.status, "item submitted");
      }
      Ok(response) => {
        warn!(id = item.id, status = response.status, "server rejected item");
      }
      Err(e) => {
        warn!(id = item.id, error = %e, "failed to submit item");
      }
    }
  }

  async fn persist_current(&self) {
    let _flight = self.flight.lock().await;
    let items = self.items();
    let store = self.record_store_write(self.store.replace_all(&items));
    self.snapshot.send_modify(|s| s.store = store);
  }

  fn record_store_write(&self, result: Result<(), StoreError>) -> BackendStatus {
    match result {
      Ok(()) => saved_or_unsupported(self.store.is_available()),
      Err(e) => {
        warn!(error = %e, "failed to write durable store");
        BackendStatus::Error
      }
    }
  }

  fn cleared_or_unsupported(&self, available: bool) -> BackendStatus {
    if available {
      BackendStatus::Cleared
    } else {
      BackendStatus::Unsupported
    }
  }
}

fn availability(available: bool) -> BackendStatus {
  if available {
    BackendStatus::Available
  } else {
    BackendStatus::Unsupported
  }
}

fn saved_or_unsupported(available: bool) -> BackendStatus {
  if available {
    BackendStatus::Saved
  } else {
    BackendStatus::Unsupported
  }
}

/// Keep the first occurrence of each id.
fn dedupe_by_id(items: Vec<Item>) -> Vec<Item> {
  let mut seen = std::collections::HashSet::new();
  items.into_iter().filter(|item| seen.insert(item.id)).collect()
}
