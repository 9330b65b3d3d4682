use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// Origin the static assets are served from (same-origin for caching)
  pub app_origin: String,
  /// Static assets precached on install, relative to `app_origin`
  pub static_assets: Vec<String>,
  pub sync: SyncConfig,
  pub connectivity: ConnectivityConfig,
  pub storage: StorageConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      api: ApiConfig::default(),
      app_origin: "http://localhost:8080/".to_string(),
      static_assets: [
        "./",
        "./index.html",
        "./style.css",
        "./app.js",
        "./manifest.json",
      ]
      .iter()
      .map(|s| s.to_string())
      .collect(),
      sync: SyncConfig::default(),
      connectivity: ConnectivityConfig::default(),
      storage: StorageConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Remote collection endpoint
  pub url: String,
  /// Upper bound on items per read (`?_limit=`)
  pub limit: usize,
  /// Owner stamped on locally created items
  pub user_id: Option<i64>,
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "https://jsonplaceholder.typicode.com/todos".to_string(),
      limit: 10,
      user_id: Some(1),
      timeout_secs: 15,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
  pub revalidate_interval_secs: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      revalidate_interval_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
  /// Probe the API host to detect online/offline transitions
  pub probe: bool,
  pub probe_interval_secs: u64,
  pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
  fn default() -> Self {
    Self {
      probe: true,
      probe_interval_secs: 10,
      probe_timeout_ms: 2000,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// When false the durable store and response cache are no-ops
  pub enabled: bool,
  /// Database file (default: $XDG_DATA_HOME/offsync/offsync.db)
  pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./offsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/offsync/config.yaml
  /// 4. Built-in defaults
  ///
  /// `OFFSYNC_API_URL` overrides `api.url` in every case.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(url) = std::env::var("OFFSYNC_API_URL") {
      config.api.url = url;
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("offsync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("offsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(contents)?)
  }

  fn validate(&self) -> Result<()> {
    self.api_url()?;
    self.app_base()?;
    if self.api.limit == 0 {
      return Err(eyre!("api.limit must be at least 1"));
    }
    if self.sync.revalidate_interval_secs == 0 {
      return Err(eyre!("sync.revalidate_interval_secs must be at least 1"));
    }
    if self.connectivity.probe_interval_secs == 0 {
      return Err(eyre!("connectivity.probe_interval_secs must be at least 1"));
    }
    Ok(())
  }

  pub fn api_url(&self) -> Result<Url> {
    Url::parse(&self.api.url).map_err(|e| eyre!("Invalid api.url '{}': {}", self.api.url, e))
  }

  /// The app origin as a base URL that relative asset paths join onto.
  pub fn app_base(&self) -> Result<Url> {
    let mut base = self.app_origin.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    Url::parse(&base).map_err(|e| eyre!("Invalid app_origin '{}': {}", self.app_origin, e))
  }

  pub fn api_timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }

  pub fn revalidate_interval(&self) -> Duration {
    Duration::from_secs(self.sync.revalidate_interval_secs)
  }
}
