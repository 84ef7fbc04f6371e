//! Read-only binary cache served over HTTP(S).
//!
//! Objects are addressed as `<endpoint>/<path>`. Every request leases a
//! transport from the pool; the lease is returned when the call ends,
//! whatever its outcome.
//!
//! Existence checks and fetches treat HTTP 403 like 404: S3 buckets answer
//! 403 for missing keys when listing is disabled.

use std::sync::Arc;

use crate::binary_cache::{init_binary_cache, BinaryCache, CacheInfo, CacheParams, CacheSettings};
use crate::error::{CacheError, CacheResult};
use crate::pool::{Pool, PoolHandle};
use crate::transport::{
    CurlTransport, RequestOptions, Transport, TransportError, TransportSettings,
};
use crate::validation_cache::ValidationCache;

pub type TransportPool = Pool<Box<dyn Transport>, TransportError>;

/// Pool of transports built by `factory`, bounded by `max_connections`
/// (`None` = unbounded). Idle transports that report themselves not
/// reusable are dropped rather than leased.
pub fn transport_pool<F>(max_connections: Option<usize>, factory: F) -> TransportPool
where
    F: Fn() -> Result<Box<dyn Transport>, TransportError> + Send + Sync + 'static,
{
    let pool = match max_connections {
        Some(max) => Pool::new(max, factory),
        None => Pool::unbounded(factory),
    };
    pool.with_validator(|transport| transport.is_reusable())
}

/// Strip one trailing `/` from an endpoint URI.
pub fn normalize_uri(uri: &str) -> String {
    uri.strip_suffix('/').unwrap_or(uri).to_string()
}

pub struct HttpBinaryCache {
    uri: String,
    params: CacheParams,
    settings: CacheSettings,
    validated: bool,
    transports: TransportPool,
    validation_cache: Arc<dyn ValidationCache>,
}

impl HttpBinaryCache {
    /// Build a backend over an explicit transport pool. No I/O happens until
    /// [`BinaryCache::init`] or the first request.
    pub fn new(
        uri: &str,
        params: CacheParams,
        validation_cache: Arc<dyn ValidationCache>,
        transports: TransportPool,
    ) -> Self {
        let settings = CacheSettings::resolve(&params, &CacheInfo::default());
        Self {
            uri: normalize_uri(uri),
            params,
            settings,
            validated: false,
            transports,
            validation_cache,
        }
    }

    /// Build a backend whose transports are libcurl handles. `max_connections`
    /// bounds the pool; `None` leaves it unbounded.
    pub fn with_curl(
        uri: &str,
        params: CacheParams,
        validation_cache: Arc<dyn ValidationCache>,
        max_connections: Option<usize>,
        settings: TransportSettings,
    ) -> Self {
        let factory =
            move || Ok::<_, TransportError>(Box::new(CurlTransport::new(settings)) as Box<dyn Transport>);
        Self::new(uri, params, validation_cache, transport_pool(max_connections, factory))
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    fn object_uri(&self, path: &str) -> String {
        format!("{}/{}", self.uri, path)
    }

    fn lease(&self) -> CacheResult<PoolHandle<'_, Box<dyn Transport>, TransportError>> {
        self.transports.get().map_err(CacheError::PoolConstruction)
    }
}

impl BinaryCache for HttpBinaryCache {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn init(&mut self) -> CacheResult<()> {
        let known = self
            .validation_cache
            .get(&self.uri)
            .map_err(CacheError::ValidationCache)?;
        if let Some(record) = known {
            tracing::debug!(uri = %self.uri, "endpoint already validated");
            let recorded = CacheInfo {
                store_dir: None,
                want_mass_query: Some(record.want_mass_query),
                priority: Some(record.priority),
            };
            self.settings = CacheSettings::resolve(&self.params, &recorded);
            self.validated = true;
            return Ok(());
        }

        let settings = match init_binary_cache(&*self, &self.params) {
            Ok(settings) => settings,
            Err(e) if e.is_unsupported_mutation() => {
                tracing::warn!(uri = %self.uri, "endpoint has no {}", crate::binary_cache::CACHE_INFO_FILE);
                return Err(CacheError::InvalidCache {
                    uri: self.uri.clone(),
                });
            }
            Err(e) => return Err(e),
        };

        self.validation_cache
            .create(&self.uri, settings.want_mass_query, settings.priority)
            .map_err(CacheError::ValidationCache)?;
        self.settings = settings;
        self.validated = true;
        tracing::info!(
            uri = %self.uri,
            want_mass_query = settings.want_mass_query,
            priority = settings.priority,
            "validated binary cache"
        );
        Ok(())
    }

    fn file_exists(&self, path: &str) -> CacheResult<bool> {
        let uri = self.object_uri(path);
        let mut transport = self.lease()?;
        match transport.probe(&uri, &RequestOptions::head()) {
            Ok(()) => Ok(true),
            Err(e) if e.is_absent() => {
                tracing::debug!(%uri, "absent: {}", e);
                Ok(false)
            }
            Err(source) => {
                transport.mark_bad();
                Err(CacheError::Transport { uri, source })
            }
        }
    }

    fn get_file(&self, path: &str) -> CacheResult<Option<Vec<u8>>> {
        let uri = self.object_uri(path);
        let mut transport = self.lease()?;
        match transport.fetch(&uri, &RequestOptions::get()) {
            Ok(body) => {
                tracing::debug!(%uri, bytes = body.len(), "fetched");
                Ok(Some(body))
            }
            Err(e) if e.is_absent() => {
                tracing::debug!(%uri, "absent: {}", e);
                Ok(None)
            }
            Err(source) => {
                transport.mark_bad();
                Err(CacheError::Transport { uri, source })
            }
        }
    }

    fn upsert_file(&self, path: &str, _data: &[u8]) -> CacheResult<()> {
        Err(CacheError::UnsupportedMutation {
            path: path.to_string(),
        })
    }

    fn settings(&self) -> CacheSettings {
        self.settings
    }
}
