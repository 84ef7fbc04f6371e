//! Transport failure type and HTTP status classification.

use thiserror::Error;

/// Outcome tag of a failed probe or fetch.
///
/// `NotFound` and `Forbidden` are kept apart so callers decide themselves
/// whether to fold them; everything else is an opaque failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP 404 not found")]
    NotFound,
    #[error("HTTP 403 forbidden")]
    Forbidden,
    /// Any other non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Curl reported an error (timeout, connection, TLS, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
}

impl TransportError {
    /// True for the two statuses read paths report as "object absent".
    pub fn is_absent(&self) -> bool {
        matches!(self, TransportError::NotFound | TransportError::Forbidden)
    }
}

/// Map a final HTTP status code to success or a transport error.
pub fn classify_status(code: u32) -> Result<(), TransportError> {
    match code {
        200..=299 => Ok(()),
        404 | 410 => Err(TransportError::NotFound),
        403 => Err(TransportError::Forbidden),
        _ => Err(TransportError::Http(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range_is_ok() {
        assert!(classify_status(200).is_ok());
        assert!(classify_status(204).is_ok());
    }

    #[test]
    fn missing_and_gone_are_not_found() {
        assert!(matches!(classify_status(404), Err(TransportError::NotFound)));
        assert!(matches!(classify_status(410), Err(TransportError::NotFound)));
    }

    #[test]
    fn forbidden_is_distinct_from_not_found() {
        let err = classify_status(403).unwrap_err();
        assert!(matches!(err, TransportError::Forbidden));
        assert!(err.is_absent());
    }

    #[test]
    fn other_statuses_are_not_absent() {
        let err = classify_status(500).unwrap_err();
        assert!(matches!(err, TransportError::Http(500)));
        assert!(!err.is_absent());
        assert!(!classify_status(401).unwrap_err().is_absent());
        assert!(!classify_status(304).unwrap_err().is_absent());
    }
}
