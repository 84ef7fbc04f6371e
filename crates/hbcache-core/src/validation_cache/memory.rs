//! Process-local validation cache. Used by tests and `--no-disk-cache`.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{unix_timestamp, ValidationCache, ValidationRecord};

#[derive(Debug, Default)]
pub struct MemoryValidationCache {
    records: Mutex<HashMap<String, ValidationRecord>>,
}

impl MemoryValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValidationCache for MemoryValidationCache {
    fn get(&self, uri: &str) -> Result<Option<ValidationRecord>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(uri).cloned())
    }

    fn create(&self, uri: &str, want_mass_query: bool, priority: i64) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .entry(uri.to_string())
            .or_insert_with(|| ValidationRecord {
                uri: uri.to_string(),
                want_mass_query,
                priority,
                created_at: unix_timestamp(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get() {
        let cache = MemoryValidationCache::new();
        assert!(!cache.exists("https://cache.example.org").unwrap());
        cache.create("https://cache.example.org", true, 40).unwrap();
        let rec = cache.get("https://cache.example.org").unwrap().unwrap();
        assert!(rec.want_mass_query);
        assert_eq!(rec.priority, 40);
        assert!(cache.exists("https://cache.example.org").unwrap());
    }

    #[test]
    fn first_writer_wins() {
        let cache = MemoryValidationCache::new();
        cache.create("http://c", false, 10).unwrap();
        cache.create("http://c", true, 99).unwrap();
        let rec = cache.get("http://c").unwrap().unwrap();
        assert!(!rec.want_mass_query);
        assert_eq!(rec.priority, 10);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_exact() {
        let cache = MemoryValidationCache::new();
        cache.create("http://c", false, 10).unwrap();
        assert!(!cache.exists("http://c/").unwrap());
        assert!(!cache.exists("https://c").unwrap());
    }
}
