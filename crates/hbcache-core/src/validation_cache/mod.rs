//! Persistent record of endpoints known to be binary caches.
//!
//! Validating an endpoint costs a network round trip, so the outcome is
//! stored keyed by the normalized endpoint URI and consulted on every backend
//! initialisation. Records are created once and never updated: creating an
//! existing record again is a no-op.

mod memory;
mod sqlite;

pub use memory::MemoryValidationCache;
pub use sqlite::SqliteValidationCache;

use anyhow::Result;

/// A validated endpoint and the attributes it is served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRecord {
    pub uri: String,
    pub want_mass_query: bool,
    pub priority: i64,
    /// Unix seconds when the record was first written.
    pub created_at: i64,
}

pub trait ValidationCache: Send + Sync {
    fn get(&self, uri: &str) -> Result<Option<ValidationRecord>>;

    /// Record `uri` as a valid cache. First writer wins; repeated calls for
    /// the same URI leave the stored record untouched.
    fn create(&self, uri: &str, want_mass_query: bool, priority: i64) -> Result<()>;

    fn exists(&self, uri: &str) -> Result<bool> {
        Ok(self.get(uri)?.is_some())
    }
}

pub(crate) fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
