//! Two-generation snapshot of live positions per account.
//!
//! Each cycle moves `cur` into `pre` and stores the fresh live set as `cur`.
//! The two cache writes are not atomic: concurrent cycles for one account can
//! interleave and leave `pre` and `cur` from different generations. Callers
//! run one cycle per account at a time.

use serde_json::Value;
use std::collections::BTreeMap;
use std::mem;
use tracing::{debug, error, warn};

use super::error::{CacheError, LedgerError};
use crate::ports::cache_port::CachePort;

/// Seven days.
pub const SNAPSHOT_TTL_SECONDS: u64 = 604_800;

/// Transaction key -> transaction attributes.
pub type PositionMap = BTreeMap<String, Value>;

/// Cache keys holding one account's pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotKeys {
    pub pre: String,
    pub cur: String,
}

impl SnapshotKeys {
    pub fn for_account(account: &str) -> Self {
        SnapshotKeys {
            pre: format!("trades_pre:{account}"),
            cur: format!("trades_cur:{account}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotPair {
    pub pre: PositionMap,
    pub cur: PositionMap,
}

impl SnapshotPair {
    /// Drop `pre`, demote `cur`, install `live` as the new `cur`.
    pub fn rotate(&mut self, live: PositionMap) {
        self.pre = mem::replace(&mut self.cur, live);
    }

    pub fn diff(&self) -> SnapshotDiff {
        SnapshotDiff {
            opened: self
                .cur
                .keys()
                .filter(|key| !self.pre.contains_key(*key))
                .cloned()
                .collect(),
            closed: self
                .pre
                .keys()
                .filter(|key| !self.cur.contains_key(*key))
                .cloned()
                .collect(),
        }
    }
}

/// Position keys that appeared or disappeared between `pre` and `cur`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub opened: Vec<String>,
    pub closed: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.closed.is_empty()
    }
}

pub struct SnapshotDiffStore<'a> {
    cache: &'a dyn CachePort,
    ttl_seconds: u64,
}

impl<'a> SnapshotDiffStore<'a> {
    pub fn new(cache: &'a dyn CachePort) -> Self {
        Self::with_ttl(cache, SNAPSHOT_TTL_SECONDS)
    }

    pub fn with_ttl(cache: &'a dyn CachePort, ttl_seconds: u64) -> Self {
        Self { cache, ttl_seconds }
    }

    /// Best-effort rotation. Cache failures are logged and swallowed;
    /// `None` means nothing was persisted for this cycle.
    pub fn record_cycle(&self, account: &str, live: &PositionMap) -> Option<SnapshotPair> {
        match self.try_record_cycle(account, live) {
            Ok(pair) => Some(pair),
            Err(e) => {
                error!(account, error = %e, "snapshot cycle not persisted");
                None
            }
        }
    }

    /// Rotation that reports cache failures to the caller.
    ///
    /// A `cur` slot that does not decode is treated as empty so the fresh
    /// live set still replaces it.
    pub fn try_record_cycle(
        &self,
        account: &str,
        live: &PositionMap,
    ) -> Result<SnapshotPair, LedgerError> {
        let keys = SnapshotKeys::for_account(account);
        let cur = match decode(self.cache.get(&keys.cur)?) {
            Ok(cur) => cur,
            Err(e) => {
                warn!(account, error = %e, "discarding undecodable current snapshot");
                PositionMap::new()
            }
        };

        let mut pair = SnapshotPair {
            pre: PositionMap::new(),
            cur,
        };
        pair.rotate(live.clone());

        self.cache.set(&keys.pre, &encode(&pair.pre)?, self.ttl_seconds)?;
        self.cache.set(&keys.cur, &encode(&pair.cur)?, self.ttl_seconds)?;
        debug!(
            account,
            pre = pair.pre.len(),
            cur = pair.cur.len(),
            "snapshot rotated"
        );
        Ok(pair)
    }

    /// Read both slots in one round trip. Missing slots read as empty.
    pub fn load_pair(&self, account: &str) -> Result<SnapshotPair, LedgerError> {
        let keys = SnapshotKeys::for_account(account);
        let mut values = self.cache.mget(&[keys.pre.as_str(), keys.cur.as_str()])?.into_iter();
        let pre = decode(values.next().flatten())?;
        let cur = decode(values.next().flatten())?;
        Ok(SnapshotPair { pre, cur })
    }
}

fn encode(map: &PositionMap) -> Result<Value, CacheError> {
    serde_json::to_value(map).map_err(|e| CacheError::new(format!("encode snapshot: {e}")))
}

fn decode(value: Option<Value>) -> Result<PositionMap, CacheError> {
    match value {
        None | Some(Value::Null) => Ok(PositionMap::new()),
        Some(v) => serde_json::from_value(v)
            .map_err(|e| CacheError::new(format!("decode snapshot: {e}"))),
    }
}
