//! In-process TTL cache adapter.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::error::CacheError;
use crate::ports::cache_port::CachePort;

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    ttl_seconds: u64,
    expires_at: Instant,
}

/// Single-threaded cache; entries vanish once their TTL has elapsed.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL the live entry under `key` was written with.
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.live(key).map(|entry| entry.ttl_seconds)
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let mut entries = self.entries.borrow_mut();
        if entries.get(key).is_some_and(|entry| entry.expires_at <= now) {
            entries.remove(key);
            return None;
        }
        entries.get(key).cloned()
    }
}

impl CachePort for MemoryCache {
    fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.clone(),
            ttl_seconds,
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
        };
        self.entries.borrow_mut().insert(key.to_string(), entry);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        Ok(self.live(key).map(|entry| entry.value))
    }
}
