//! Error taxonomy shared by the binary cache backends.

use thiserror::Error;

use crate::transport::TransportError;

pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by [`crate::binary_cache::BinaryCache`] implementations.
///
/// Read operations fold "not found" and "forbidden" into an absent result, so
/// those two never appear here wrapped in `Transport`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The transport failed for a reason other than the object being absent
    /// (network, protocol, timeout, unexpected HTTP status).
    #[error("request for '{uri}' failed")]
    Transport {
        uri: String,
        #[source]
        source: TransportError,
    },

    /// Write attempted on a read-only backend. No I/O was performed.
    #[error("uploading to an HTTP binary cache is not supported (path '{path}')")]
    UnsupportedMutation { path: String },

    /// Endpoint lacks the cache marker and cannot be initialised read-only.
    #[error("‘{uri}’ does not appear to be a binary cache")]
    InvalidCache { uri: String },

    #[error("binary cache '{uri}' is for store directory '{advertised}', but this store uses '{expected}'")]
    StoreDirMismatch {
        uri: String,
        advertised: String,
        expected: String,
    },

    #[error("validation cache: {0:#}")]
    ValidationCache(anyhow::Error),

    /// The transport factory could not build a new handle.
    #[error("could not construct HTTP transport")]
    PoolConstruction(#[source] TransportError),

    #[error("don't know how to open binary cache '{uri}'")]
    UnsupportedUri { uri: String },
}

impl CacheError {
    pub fn is_unsupported_mutation(&self) -> bool {
        matches!(self, CacheError::UnsupportedMutation { .. })
    }
}
