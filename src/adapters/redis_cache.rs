//! Redis cache adapter. Values are stored as JSON strings with `SET .. EX`.

use redis::{Client, Connection, RedisResult};
use serde_json::Value;
use std::cell::RefCell;

use crate::domain::error::{CacheError, LedgerError};
use crate::ports::cache_port::CachePort;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Holds one connection, opened on first use. A failed command drops it and
/// the next command reconnects.
pub struct RedisCache {
    client: Client,
    connection: RefCell<Option<Connection>>,
}

impl RedisCache {
    pub fn open(url: &str) -> Result<Self, LedgerError> {
        let client = Client::open(url).map_err(|e| CacheError::new(e.to_string()))?;
        Ok(Self {
            client,
            connection: RefCell::new(None),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LedgerError> {
        let url = config
            .get_string("cache", "url")
            .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
        Self::open(&url)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.borrow().is_some()
    }

    fn with_connection<T>(
        &self,
        command: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, CacheError> {
        let mut slot = self.connection.borrow_mut();
        let mut con = match slot.take() {
            Some(con) => con,
            None => self
                .client
                .get_connection()
                .map_err(|e| CacheError::new(e.to_string()))?,
        };
        let result = command(&mut con).map_err(|e| CacheError::new(e.to_string()))?;
        *slot = Some(con);
        Ok(result)
    }
}

fn parse(raw: Option<String>) -> Result<Option<Value>, CacheError> {
    raw.map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| CacheError::new(format!("invalid JSON in cache: {e}")))
}

impl CachePort for RedisCache {
    fn set(&self, key: &str, value: &Value, ttl_seconds: u64) -> Result<(), CacheError> {
        self.with_connection(|con| {
            redis::cmd("SET")
                .arg(key)
                .arg(value.to_string())
                .arg("EX")
                .arg(ttl_seconds)
                .query::<()>(con)
        })
    }

    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let raw: Option<String> =
            self.with_connection(|con| redis::cmd("GET").arg(key).query(con))?;
        parse(raw)
    }

    fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<Option<String>> =
            self.with_connection(|con| redis::cmd("MGET").arg(keys).query(con))?;
        raw.into_iter().map(parse).collect()
    }
}
