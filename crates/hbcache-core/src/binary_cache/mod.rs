//! Generic binary cache contract and the shared initialisation routine.
//!
//! A backend only has to provide object-level primitives (`file_exists`,
//! `get_file`, `upsert_file`); [`init_binary_cache`] uses them to confirm the
//! endpoint carries the `nix-cache-info` marker object.

mod cache_info;

pub use cache_info::CacheInfo;

use crate::error::{CacheError, CacheResult};

/// Well-known marker object present at the root of every binary cache.
pub const CACHE_INFO_FILE: &str = "nix-cache-info";

pub const DEFAULT_STORE_DIR: &str = "/nix/store";

/// Priority used when neither the caller nor the endpoint specifies one.
/// Lower values are preferred.
pub const DEFAULT_PRIORITY: i64 = 50;

/// Caller-supplied backend configuration.
///
/// `None` attributes are taken from the endpoint's `nix-cache-info`, falling
/// back to the defaults above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheParams {
    pub store_dir: String,
    pub want_mass_query: Option<bool>,
    pub priority: Option<i64>,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            store_dir: DEFAULT_STORE_DIR.to_string(),
            want_mass_query: None,
            priority: None,
        }
    }
}

/// Attributes a backend is served with once initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Bulk existence queries are cheap against this endpoint.
    pub want_mass_query: bool,
    pub priority: i64,
}

impl CacheSettings {
    /// Resolve `params` over advertised values, then defaults.
    pub fn resolve(params: &CacheParams, advertised: &CacheInfo) -> Self {
        Self {
            want_mass_query: params
                .want_mass_query
                .or(advertised.want_mass_query)
                .unwrap_or(false),
            priority: params
                .priority
                .or(advertised.priority)
                .unwrap_or(DEFAULT_PRIORITY),
        }
    }
}

/// A store of immutable artifacts addressed by relative object paths.
pub trait BinaryCache: Send + Sync {
    /// Normalized endpoint URI (no trailing `/`).
    fn uri(&self) -> &str;

    /// Make the backend ready for use, validating the endpoint if needed.
    fn init(&mut self) -> CacheResult<()>;

    fn file_exists(&self, path: &str) -> CacheResult<bool>;

    /// Object body, or `None` when the object is absent.
    fn get_file(&self, path: &str) -> CacheResult<Option<Vec<u8>>>;

    fn upsert_file(&self, path: &str, data: &[u8]) -> CacheResult<()>;

    fn settings(&self) -> CacheSettings;
}

/// Confirm `cache` is a binary cache for `params.store_dir`.
///
/// When the marker object is missing it is created, so on a read-only backend
/// this returns the backend's `UnsupportedMutation` error. Returns the
/// effective settings on success.
pub fn init_binary_cache<C>(cache: &C, params: &CacheParams) -> CacheResult<CacheSettings>
where
    C: BinaryCache + ?Sized,
{
    let advertised = if cache.file_exists(CACHE_INFO_FILE)? {
        cache
            .get_file(CACHE_INFO_FILE)?
            .map(|body| CacheInfo::parse(&String::from_utf8_lossy(&body)))
    } else {
        None
    };

    let info = match advertised {
        Some(info) => info,
        None => {
            tracing::debug!(uri = cache.uri(), "no {} found, creating it", CACHE_INFO_FILE);
            let marker = CacheInfo::for_store_dir(&params.store_dir);
            cache.upsert_file(CACHE_INFO_FILE, marker.render().as_bytes())?;
            marker
        }
    };

    if let Some(advertised_dir) = &info.store_dir {
        if advertised_dir != &params.store_dir {
            return Err(CacheError::StoreDirMismatch {
                uri: cache.uri().to_string(),
                advertised: advertised_dir.clone(),
                expected: params.store_dir.clone(),
            });
        }
    }

    Ok(CacheSettings::resolve(params, &info))
}
