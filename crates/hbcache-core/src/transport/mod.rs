//! HTTP transport used by the binary cache backend.
//!
//! A [`Transport`] is a stateful client that can be reused across requests;
//! the backend keeps several of them in a [`crate::pool::Pool`] and leases one
//! per call. [`CurlTransport`] is the libcurl implementation.

mod curl_easy;
mod error;

pub use curl_easy::{CurlTransport, TransportSettings};
pub use error::{classify_status, TransportError};

/// Per-request options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Report transfer progress (logged at trace level).
    pub show_progress: bool,
    /// Issue a HEAD request; no body is transferred.
    pub head_only: bool,
}

impl RequestOptions {
    /// Existence probe: HEAD, no progress output.
    pub fn head() -> Self {
        Self {
            show_progress: false,
            head_only: true,
        }
    }

    /// Full body fetch, no progress output.
    pub fn get() -> Self {
        Self {
            show_progress: false,
            head_only: false,
        }
    }
}

/// A client able to probe and fetch arbitrary URIs.
///
/// Implementations may keep connection state between calls; the pool
/// guarantees a value is used by one caller at a time, hence `&mut self`.
pub trait Transport: Send {
    /// Check that `uri` is retrievable without transferring its body.
    fn probe(&mut self, uri: &str, options: &RequestOptions) -> Result<(), TransportError>;

    /// Retrieve the full body of `uri`.
    fn fetch(&mut self, uri: &str, options: &RequestOptions) -> Result<Vec<u8>, TransportError>;

    /// Whether an idle transport may be leased again.
    fn is_reusable(&self) -> bool {
        true
    }
}
