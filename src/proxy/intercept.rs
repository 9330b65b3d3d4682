use futures::future::try_join_all;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::{Origin, Url};

use crate::cache::{ResponseCache, DATA_PARTITION, KNOWN_PARTITIONS, STATIC_PARTITION};
use crate::error::{CacheError, TransportError};
use crate::net::{Request, Response, Transport};

/// Lifecycle of the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
  /// Constructed, nothing precached yet
  Parsed,
  /// Static assets precached
  Installed,
  /// Stale partitions purged; intercepting requests
  Activated,
}

/// Installation failed; no partial precache was committed.
#[derive(Debug, Error)]
pub enum InstallError {
  #[error("invalid asset path '{0}'")]
  InvalidAsset(String),

  #[error("failed to precache {url}: {source}")]
  Fetch {
    url: String,
    #[source]
    source: TransportError,
  },

  #[error("failed to store precached assets: {0}")]
  Cache(#[from] CacheError),
}

/// Intercepts outbound requests and applies network-first caching to the API
/// origin and cache-first caching to everything else.
pub struct InterceptProxy {
  network: Arc<dyn Transport>,
  cache: Arc<dyn ResponseCache>,
  api_origin: Origin,
  app_base: Url,
  assets: Vec<String>,
  state: Mutex<ProxyState>,
}

impl InterceptProxy {
  /// `app_base` is the same-origin root the static `assets` are relative to.
  pub fn new(
    network: Arc<dyn Transport>,
    cache: Arc<dyn ResponseCache>,
    api_url: &Url,
    app_base: Url,
    assets: Vec<String>,
  ) -> Self {
    Self {
      network,
      cache,
      api_origin: api_url.origin(),
      app_base,
      assets,
      state: Mutex::new(ProxyState::Parsed),
    }
  }

  pub fn state(&self) -> ProxyState {
    *self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn set_state(&self, state: ProxyState) {
    *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
  }

  /// Precache the static asset list, all or nothing.
  ///
  /// Every asset is fetched before anything is written; a single transport
  /// failure or non-2xx response aborts the install.
  pub async fn install(&self) -> Result<usize, InstallError> {
    info!(count = self.assets.len(), "installing: precaching static assets");

    let requests = self
      .assets
      .iter()
      .map(|asset| {
        self
          .app_base
          .join(asset)
          .map(Request::get)
          .map_err(|_| InstallError::InvalidAsset(asset.clone()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    let fetches = requests.into_iter().map(|request| async move {
      let key = request.cache_key();
      let response = self
        .network
        .send(request)
        .await
        .and_then(Response::error_for_status)
        .map_err(|source| InstallError::Fetch {
          url: key.clone(),
          source,
        })?;
      Ok::<_, InstallError>((key, response))
    });
    let entries = try_join_all(fetches).await?;

    self.cache.put_all(STATIC_PARTITION, &entries)?;
    self.set_state(ProxyState::Installed);
    Ok(entries.len())
  }

  /// Delete every partition outside the known set and start intercepting.
  /// Returns the names of the deleted partitions.
  pub fn activate(&self) -> Result<Vec<String>, CacheError> {
    let mut deleted = Vec::new();
    for partition in self.cache.partitions()? {
      if !KNOWN_PARTITIONS.contains(&partition.as_str()) {
        info!(%partition, "deleting stale cache partition");
        self.cache.delete_partition(&partition)?;
        deleted.push(partition);
      }
    }
    self.set_state(ProxyState::Activated);
    Ok(deleted)
  }

  /// Route a request through the strategy for its origin.
  pub async fn handle(&self, request: Request) -> Result<Response, TransportError> {
    if self.state() != ProxyState::Activated {
      // Not controlling clients yet
      return self.network.send(request).await;
    }

    if request.url.origin() == self.api_origin {
      self.network_first(request).await
    } else {
      self.cache_first(request).await
    }
  }

  async fn network_first(&self, request: Request) -> Result<Response, TransportError> {
    let key = request.cache_key();

    match self.network.send(request).await {
      Ok(response) => {
        if response.is_success() {
          let copy = response.clone();
          if let Err(e) = self.cache.put(DATA_PARTITION, &key, &copy) {
            warn!(%key, error = %e, "failed to cache API response");
          }
        }
        Ok(response)
      }
      Err(e) => match self.cache.match_key(DATA_PARTITION, &key) {
        Ok(Some(cached)) => {
          debug!(%key, "network failed, serving cached API response");
          Ok(cached)
        }
        Ok(None) => Err(e),
        Err(cache_err) => {
          warn!(%key, error = %cache_err, "cache lookup failed");
          Err(e)
        }
      },
    }
  }

  async fn cache_first(&self, request: Request) -> Result<Response, TransportError> {
    let key = request.cache_key();
    let cacheable = request.method == reqwest::Method::GET;

    if cacheable {
      match self.cache.match_key(STATIC_PARTITION, &key) {
        Ok(Some(cached)) => {
          debug!(%key, "serving from static cache");
          return Ok(cached);
        }
        Ok(None) => {}
        Err(e) => warn!(%key, error = %e, "cache lookup failed"),
      }
    }

    let response = self.network.send(request).await?;

    if cacheable && response.status == 200 && self.is_same_origin(&response) {
      let copy = response.clone();
      if let Err(e) = self.cache.put(STATIC_PARTITION, &key, &copy) {
        warn!(%key, error = %e, "failed to cache static response");
      }
    }

    Ok(response)
  }

  /// A response is same-origin ("basic") when its final URL shares the app
  /// origin.
  fn is_same_origin(&self, response: &Response) -> bool {
    Url::parse(&response.url)
      .map(|url| url.origin() == self.app_base.origin())
      .unwrap_or(false)
  }
}
