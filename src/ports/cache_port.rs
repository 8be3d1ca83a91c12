//! Key-value cache port trait.
//!
//! Values are structured JSON documents; every write carries its own TTL.

use crate::domain::error::CacheError;
use serde_json::Value;

pub trait CachePort {
    fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<(), CacheError>;

    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// One entry per requested key, in request order.
    fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, CacheError> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}
