//! Maps cache URIs to backend implementations.
//!
//! Each factory inspects the URI and either declines (`None`) or returns an
//! initialised backend. Factories are tried in registration order; the first
//! one that accepts the URI decides the outcome.

use std::sync::Arc;

use crate::binary_cache::{BinaryCache, CacheParams};
use crate::config::HbcacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::http_cache::HttpBinaryCache;
use crate::transport::TransportSettings;
use crate::validation_cache::ValidationCache;

/// Collaborators handed to every factory.
#[derive(Clone)]
pub struct RegistryContext {
    pub validation_cache: Arc<dyn ValidationCache>,
    /// Transport pool bound per backend; `None` is unbounded.
    pub max_connections: Option<usize>,
    pub transport: TransportSettings,
}

impl RegistryContext {
    pub fn new(validation_cache: Arc<dyn ValidationCache>) -> Self {
        Self {
            validation_cache,
            max_connections: None,
            transport: TransportSettings::default(),
        }
    }

    pub fn from_config(cfg: &HbcacheConfig, validation_cache: Arc<dyn ValidationCache>) -> Self {
        Self {
            validation_cache,
            max_connections: cfg.max_connections,
            transport: cfg.transport_settings(),
        }
    }
}

pub type StoreFactory = Box<
    dyn Fn(&str, &CacheParams, &RegistryContext) -> Option<CacheResult<Box<dyn BinaryCache>>>
        + Send
        + Sync,
>;

#[derive(Default)]
pub struct StoreRegistry {
    factories: Vec<StoreFactory>,
}

impl StoreRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that knows the built-in backends (HTTP/HTTPS).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(open_http_cache);
        registry
    }

    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn(&str, &CacheParams, &RegistryContext) -> Option<CacheResult<Box<dyn BinaryCache>>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.push(Box::new(factory));
    }

    /// Open `uri` with the first factory that accepts it.
    pub fn open(
        &self,
        uri: &str,
        params: &CacheParams,
        ctx: &RegistryContext,
    ) -> CacheResult<Box<dyn BinaryCache>> {
        for factory in &self.factories {
            if let Some(result) = factory(uri, params, ctx) {
                return result;
            }
        }
        Err(CacheError::UnsupportedUri {
            uri: uri.to_string(),
        })
    }
}

/// True for URIs the HTTP backend serves. Case-sensitive.
pub fn is_http_uri(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Factory for `http://` and `https://` URIs. The backend is initialised
/// before being returned, so a failed validation yields no backend at all.
pub fn open_http_cache(
    uri: &str,
    params: &CacheParams,
    ctx: &RegistryContext,
) -> Option<CacheResult<Box<dyn BinaryCache>>> {
    if !is_http_uri(uri) {
        return None;
    }
    let mut cache = HttpBinaryCache::with_curl(
        uri,
        params.clone(),
        Arc::clone(&ctx.validation_cache),
        ctx.max_connections,
        ctx.transport,
    );
    Some(
        cache
            .init()
            .map(|()| Box::new(cache) as Box<dyn BinaryCache>),
    )
}
