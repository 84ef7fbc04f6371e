use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::binary_cache::{CacheParams, DEFAULT_STORE_DIR};
use crate::transport::TransportSettings;

/// Global configuration loaded from `~/.config/hbcache/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HbcacheConfig {
    /// Maximum concurrent transport handles per cache (None = unbounded).
    #[serde(default)]
    pub max_connections: Option<usize>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds.
    pub timeout_secs: u64,
    /// Retire transport handles after this many seconds (None = never).
    #[serde(default)]
    pub max_handle_age_secs: Option<u64>,
    /// Store directory caches must advertise in `nix-cache-info`.
    pub store_dir: String,
    /// Force the mass-query hint instead of taking it from the cache.
    #[serde(default)]
    pub want_mass_query: Option<bool>,
    /// Force the cache priority instead of taking it from the cache.
    #[serde(default)]
    pub priority: Option<i64>,
    /// Validation database path (None = `~/.local/state/hbcache/validation.db`).
    #[serde(default)]
    pub validation_db: Option<PathBuf>,
}

impl Default for HbcacheConfig {
    fn default() -> Self {
        Self {
            max_connections: None,
            connect_timeout_secs: 15,
            timeout_secs: 300,
            max_handle_age_secs: None,
            store_dir: DEFAULT_STORE_DIR.to_string(),
            want_mass_query: None,
            priority: None,
            validation_db: None,
        }
    }
}

impl HbcacheConfig {
    pub fn cache_params(&self) -> CacheParams {
        CacheParams {
            store_dir: self.store_dir.clone(),
            want_mass_query: self.want_mass_query,
            priority: self.priority,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            max_handle_age: self.max_handle_age_secs.map(Duration::from_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hbcache")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HbcacheConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<HbcacheConfig> {
    if !path.exists() {
        let default_cfg = HbcacheConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: HbcacheConfig = toml::from_str(&data)?;
    Ok(cfg)
}
