#![allow(dead_code)]

use fxledger::domain::error::{CacheError, VenueError};
use fxledger::domain::ledger::Ledger;
use fxledger::domain::snapshot::PositionMap;
use fxledger::domain::trade::Direction;
use fxledger::ports::cache_port::CachePort;
use fxledger::ports::venue_port::{CloseOutcome, LiveTransaction, PositionHandle, VenuePort};
use serde_json::{json, Value};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

pub const DAY_MS: i64 = 86_400_000;
/// 2024-01-01T00:00:00Z
pub const T0: i64 = 1_704_067_200_000;

pub fn day(n: i64) -> i64 {
    T0 + n * DAY_MS
}

pub fn eurusd_ledger() -> Ledger {
    Ledger::new("EURUSD", 4, 1.0)
}

pub fn positions(keys: &[&str]) -> PositionMap {
    keys.iter()
        .map(|k| (k.to_string(), json!({ "symbol": "EURUSD", "key": k })))
        .collect()
}

/// Venue double: opens append to `trade_rec`, closes remove from it.
pub struct MockVenue {
    pub live: BTreeMap<String, LiveTransaction>,
    pub pending: BTreeMap<String, LiveTransaction>,
    pub rejected_orders: HashMap<u64, String>,
    pub price: f64,
    pub next_order_id: u64,
    pub refreshes: usize,
}

impl MockVenue {
    pub fn new() -> Self {
        Self {
            live: BTreeMap::new(),
            pending: BTreeMap::new(),
            rejected_orders: HashMap::new(),
            price: 1.1,
            next_order_id: 1000,
            refreshes: 0,
        }
    }

    pub fn with_position(mut self, key: &str, order_id: u64, symbol: &str, mode: Direction) -> Self {
        self.pending.insert(
            key.to_string(),
            LiveTransaction {
                order_id,
                symbol: symbol.to_string(),
                mode,
                volume: 0.1,
                open_price: self.price,
                open_time_ms: T0,
            },
        );
        self
    }

    pub fn reject(mut self, order_id: u64, reason: &str) -> Self {
        self.rejected_orders.insert(order_id, reason.to_string());
        self
    }
}

impl VenuePort for MockVenue {
    fn open_trade(
        &mut self,
        direction: Direction,
        symbol: &str,
        volume: f64,
        _rate_tp: f64,
        _rate_sl: f64,
    ) -> Result<PositionHandle, VenueError> {
        if volume <= 0.0 {
            return Err(VenueError::Rejected {
                reason: "invalid volume".into(),
            });
        }
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        self.pending.insert(
            format!("tx{order_id}"),
            LiveTransaction {
                order_id,
                symbol: symbol.to_string(),
                mode: direction,
                volume,
                open_price: self.price,
                open_time_ms: T0,
            },
        );
        Ok(PositionHandle { order_id })
    }

    fn close_trade_only(&mut self, order_id: u64) -> Result<CloseOutcome, VenueError> {
        if let Some(reason) = self.rejected_orders.get(&order_id) {
            return Err(VenueError::Rejected {
                reason: reason.clone(),
            });
        }
        self.pending.retain(|_, tx| tx.order_id != order_id);
        Ok(CloseOutcome {
            order_id,
            close_price: self.price,
        })
    }

    fn update_trades(&mut self) -> Result<(), VenueError> {
        self.refreshes += 1;
        self.live = self.pending.clone();
        Ok(())
    }

    fn trade_rec(&self) -> &BTreeMap<String, LiveTransaction> {
        &self.live
    }
}

/// Cache whose backend can be switched off mid-test.
pub struct FlakyCache {
    pub data: std::cell::RefCell<HashMap<String, Value>>,
    pub online: Cell<bool>,
    pub writes: Cell<usize>,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self {
            data: std::cell::RefCell::new(HashMap::new()),
            online: Cell::new(true),
            writes: Cell::new(0),
        }
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.online.get() {
            Ok(())
        } else {
            Err(CacheError::new("connection refused"))
        }
    }
}

impl CachePort for FlakyCache {
    fn set(&self, key: &str, value: &Value, _ttl_seconds: u64) -> Result<(), CacheError> {
        self.check()?;
        self.writes.set(self.writes.get() + 1);
        self.data.borrow_mut().insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.check()?;
        Ok(self.data.borrow().get(key).cloned())
    }
}
