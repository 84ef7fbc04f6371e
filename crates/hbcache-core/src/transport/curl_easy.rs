//! libcurl-backed transport.
//!
//! Wraps one `curl::easy::Easy` handle. The handle is reused for every
//! request so libcurl can keep connections alive between leases.

use std::time::{Duration, Instant};

use curl::easy::Easy;

use super::error::{classify_status, TransportError};
use super::{RequestOptions, Transport};

/// Timeouts applied to every request issued by a [`CurlTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    /// Hard limit for a whole transfer.
    pub timeout: Duration,
    /// Handles older than this are retired by the pool instead of reused.
    pub max_handle_age: Option<Duration>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
            max_handle_age: None,
        }
    }
}

pub struct CurlTransport {
    easy: Easy,
    settings: TransportSettings,
    created: Instant,
}

impl CurlTransport {
    pub fn new(settings: TransportSettings) -> Self {
        Self {
            easy: Easy::new(),
            settings,
            created: Instant::now(),
        }
    }

    /// Configure the handle for one request and run it. Returns the body
    /// (empty for HEAD) once the final status has been classified.
    fn perform(&mut self, uri: &str, options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        let easy = &mut self.easy;
        easy.url(uri)?;
        if options.head_only {
            easy.nobody(true)?;
        } else {
            // Resetting NOBODY alone does not switch a reused handle back to GET.
            easy.nobody(false)?;
            easy.get(true)?;
        }
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.settings.connect_timeout)?;
        easy.timeout(self.settings.timeout)?;
        easy.progress(options.show_progress)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            if options.show_progress {
                transfer.progress_function(|dl_total, dl_now, _, _| {
                    tracing::trace!(uri, dl_now, dl_total, "transfer progress");
                    true
                })?;
            }
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        classify_status(code)?;
        Ok(body)
    }
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::new(TransportSettings::default())
    }
}

impl Transport for CurlTransport {
    fn probe(&mut self, uri: &str, options: &RequestOptions) -> Result<(), TransportError> {
        let options = RequestOptions {
            head_only: true,
            ..*options
        };
        self.perform(uri, &options).map(|_| ())
    }

    fn fetch(&mut self, uri: &str, options: &RequestOptions) -> Result<Vec<u8>, TransportError> {
        let options = RequestOptions {
            head_only: false,
            ..*options
        };
        self.perform(uri, &options)
    }

    fn is_reusable(&self) -> bool {
        self.settings
            .max_handle_age
            .map_or(true, |max| self.created.elapsed() < max)
    }
}
