//! Builds the engine, proxy and storage backends from configuration.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{NoopResponseCache, ResponseCache, SqliteResponseCache};
use crate::config::Config;
use crate::connectivity::{spawn_probe, ConnectivityMonitor, ConnectivityState, ProbeHandle};
use crate::db;
use crate::items::ItemsApi;
use crate::net::{HttpTransport, Transport};
use crate::proxy::InterceptProxy;
use crate::store::{DurableStore, NoopStore, SqliteStore};
use crate::sync::{EngineOptions, SyncEngine};

/// Everything a front end needs, wired together.
pub struct Services {
  pub engine: Arc<SyncEngine>,
  pub proxy: Arc<InterceptProxy>,
  probe: Option<ProbeHandle>,
}

impl Services {
  /// Open the backends, activate the proxy and start the connectivity probe.
  ///
  /// Storage failures degrade to no-op backends instead of aborting.
  pub fn build(config: &Config, offline: bool) -> Result<Self> {
    let (store, cache) = open_backends(config);
    let network: Arc<dyn Transport> = Arc::new(
      HttpTransport::new(config.api_timeout())
        .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?,
    );
    Self::assemble(config, offline, network, store, cache)
  }

  /// Wire the engine and the proxy over one network transport.
  ///
  /// The engine talks to the network directly. The proxy fronts the same
  /// network for `install` and `fetch`, and the two only meet in the shared
  /// store and cache.
  fn assemble(
    config: &Config,
    offline: bool,
    network: Arc<dyn Transport>,
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn ResponseCache>,
  ) -> Result<Self> {
    let api_url = config.api_url()?;

    let proxy = Arc::new(InterceptProxy::new(
      Arc::clone(&network),
      Arc::clone(&cache),
      &api_url,
      config.app_base()?,
      config.static_assets.clone(),
    ));
    match proxy.activate() {
      Ok(deleted) if !deleted.is_empty() => {
        info!(?deleted, "purged stale cache partitions");
      }
      Ok(_) => {}
      Err(e) => warn!(error = %e, "proxy activation could not inspect the cache"),
    }

    let initial = if offline {
      ConnectivityState::Offline
    } else {
      ConnectivityState::Online
    };
    let connectivity = Arc::new(ConnectivityMonitor::new(initial));

    let probe = if offline || !config.connectivity.probe {
      None
    } else {
      spawn_probe(
        Arc::clone(&connectivity),
        &api_url,
        Duration::from_secs(config.connectivity.probe_interval_secs),
        Duration::from_millis(config.connectivity.probe_timeout_ms),
      )
    };

    let engine = Arc::new(SyncEngine::new(
      ItemsApi::new(api_url, config.api.limit),
      network,
      store,
      cache,
      connectivity,
      EngineOptions {
        user_id: config.api.user_id,
      },
    ));

    Ok(Self {
      engine,
      proxy,
      probe,
    })
  }

  /// Wait for outstanding submissions and stop the probe.
  pub async fn shutdown(self) {
    self.engine.flush().await;
    if let Some(probe) = self.probe {
      probe.shutdown().await;
    }
  }
}

/// Open the durable store and response cache, each on its own connection.
fn open_backends(config: &Config) -> (Arc<dyn DurableStore>, Arc<dyn ResponseCache>) {
  if !config.storage.enabled {
    info!("storage disabled, running without persistence");
    return (Arc::new(NoopStore), Arc::new(NoopResponseCache));
  }

  let path = match config.storage.path.clone().map(Ok).unwrap_or_else(db::default_path) {
    Ok(path) => path,
    Err(e) => {
      warn!(error = %e, "no data directory, running without persistence");
      return (Arc::new(NoopStore), Arc::new(NoopResponseCache));
    }
  };

  let store: Arc<dyn DurableStore> = match db::connect(&path)
    .and_then(|conn| SqliteStore::new(conn).map_err(|e| eyre!(e)))
  {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!(error = %e, path = %path.display(), "durable store unavailable");
      Arc::new(NoopStore)
    }
  };

  let cache: Arc<dyn ResponseCache> = match db::connect(&path)
    .and_then(|conn| SqliteResponseCache::new(conn).map_err(|e| eyre!(e)))
  {
    Ok(cache) => Arc::new(cache),
    Err(e) => {
      warn!(error = %e, path = %path.display(), "response cache unavailable");
      Arc::new(NoopResponseCache)
    }
  };

  (store, cache)
}
