//! Venue-facing trade triggers and live-position snapshots.
//!
//! Venue rejections are returned as values so a batch keeps going after one
//! order is refused.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::config_validation::Settings;
use super::error::{CacheError, LedgerError, VenueError};
use super::snapshot::{PositionMap, SnapshotDiffStore, SnapshotPair};
use super::trade::Direction;
use crate::ports::venue_port::{CloseOutcome, PositionHandle, VenuePort};

/// Result of one close attempt within a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseAttempt {
    Closed(CloseOutcome),
    Rejected(String),
}

impl CloseAttempt {
    pub fn is_closed(&self) -> bool {
        matches!(self, CloseAttempt::Closed(_))
    }
}

/// Open a position on the venue with the configured volume and TP/SL.
pub fn trigger_open_trade(
    venue: &mut dyn VenuePort,
    symbol: &str,
    direction: Direction,
    settings: &Settings,
) -> Result<PositionHandle, VenueError> {
    venue.open_trade(
        direction,
        symbol,
        settings.volume,
        settings.rate_tp,
        settings.rate_sl,
    )
}

/// Close every live position on `symbol` in `direction`.
///
/// A failed refresh is returned as an error. Individual close failures are
/// recorded under the position key and do not stop the batch.
pub fn close_open_positions(
    venue: &mut dyn VenuePort,
    symbol: &str,
    direction: Direction,
) -> Result<BTreeMap<String, CloseAttempt>, VenueError> {
    venue.update_trades()?;
    let orders: Vec<(String, u64)> = venue
        .trade_rec()
        .iter()
        .filter(|(_, tx)| tx.symbol == symbol && tx.mode == direction)
        .map(|(key, tx)| (key.clone(), tx.order_id))
        .collect();
    debug!(symbol, %direction, ?orders, "orders to be closed");

    let mut results = BTreeMap::new();
    for (key, order_id) in orders {
        let attempt = match venue.close_trade_only(order_id) {
            Ok(outcome) => CloseAttempt::Closed(outcome),
            Err(e) => {
                warn!(symbol, order_id, error = %e, "close rejected");
                CloseAttempt::Rejected(format!("Exception: {e}"))
            }
        };
        results.insert(key, attempt);
    }
    Ok(results)
}

/// Live positions as snapshot attributes.
pub fn live_positions(venue: &dyn VenuePort) -> Result<PositionMap, LedgerError> {
    venue
        .trade_rec()
        .iter()
        .map(|(key, tx)| {
            serde_json::to_value(tx)
                .map(|value| (key.clone(), value))
                .map_err(|e| {
                    LedgerError::from(CacheError::new(format!("encode position {key}: {e}")))
                })
        })
        .collect()
}

/// Refresh the venue and rotate the account's snapshot pair.
///
/// Nothing is stored when the venue reports no live positions. Cache
/// failures are absorbed by the store; `Ok(None)` then means no snapshot was
/// persisted this cycle.
pub fn store_trade_rec(
    venue: &mut dyn VenuePort,
    store: &SnapshotDiffStore<'_>,
    account: &str,
) -> Result<Option<SnapshotPair>, LedgerError> {
    venue.update_trades()?;
    if venue.trade_rec().is_empty() {
        debug!(account, "no live positions, snapshot untouched");
        return Ok(None);
    }
    let live = live_positions(venue)?;
    Ok(store.record_cycle(account, &live))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_cache::MemoryCache;
    use crate::ports::venue_port::LiveTransaction;
    use std::collections::HashSet;

    #[derive(Default)]
    struct StubVenue {
        live: BTreeMap<String, LiveTransaction>,
        refreshed: usize,
        refuse: HashSet<u64>,
        offline: bool,
        opened: Vec<(Direction, String, f64, f64, f64)>,
    }

    impl StubVenue {
        fn with(mut self, key: &str, order_id: u64, symbol: &str, mode: Direction) -> Self {
            self.live.insert(
                key.to_string(),
                LiveTransaction {
                    order_id,
                    symbol: symbol.to_string(),
                    mode,
                    volume: 0.1,
                    open_price: 1.1,
                    open_time_ms: 0,
                },
            );
            self
        }
    }

    impl VenuePort for StubVenue {
        fn open_trade(
            &mut self,
            direction: Direction,
            symbol: &str,
            volume: f64,
            rate_tp: f64,
            rate_sl: f64,
        ) -> Result<PositionHandle, VenueError> {
            if self.offline {
                return Err(VenueError::Rejected {
                    reason: "market closed".into(),
                });
            }
            self.opened
                .push((direction, symbol.to_string(), volume, rate_tp, rate_sl));
            Ok(PositionHandle { order_id: 77 })
        }

        fn close_trade_only(&mut self, order_id: u64) -> Result<CloseOutcome, VenueError> {
            if self.refuse.contains(&order_id) {
                return Err(VenueError::Rejected {
                    reason: format!("order {order_id} locked"),
                });
            }
            Ok(CloseOutcome {
                order_id,
                close_price: 1.2,
            })
        }

        fn update_trades(&mut self) -> Result<(), VenueError> {
            if self.offline {
                return Err(VenueError::Unavailable {
                    reason: "socket closed".into(),
                });
            }
            self.refreshed += 1;
            Ok(())
        }

        fn trade_rec(&self) -> &BTreeMap<String, LiveTransaction> {
            &self.live
        }
    }

    fn settings() -> Settings {
        Settings {
            algorithm: "rsi".into(),
            timeframe: 15,
            symbols: vec!["EURUSD".into()],
            volume: 0.5,
            rate_tp: 30.0,
            rate_sl: 20.0,
            digits: 4,
            account: None,
            cache_ttl_seconds: 60,
            utc_offset_hours: 7,
        }
    }

    #[test]
    fn trigger_open_uses_settings() {
        let mut venue = StubVenue::default();
        let handle = trigger_open_trade(&mut venue, "EURUSD", Direction::Sell, &settings()).unwrap();
        assert_eq!(handle.order_id, 77);
        assert_eq!(
            venue.opened,
            vec![(Direction::Sell, "EURUSD".to_string(), 0.5, 30.0, 20.0)]
        );
    }

    #[test]
    fn trigger_open_returns_rejection() {
        let mut venue = StubVenue {
            offline: true,
            ..Default::default()
        };
        let err = trigger_open_trade(&mut venue, "EURUSD", Direction::Buy, &settings()).unwrap_err();
        assert!(matches!(err, VenueError::Rejected { .. }));
    }

    #[test]
    fn close_filters_symbol_and_direction() {
        let mut venue = StubVenue::default()
            .with("t1", 1, "EURUSD", Direction::Buy)
            .with("t2", 2, "EURUSD", Direction::Sell)
            .with("t3", 3, "GBPUSD", Direction::Buy)
            .with("t4", 4, "EURUSD", Direction::Buy);

        let results = close_open_positions(&mut venue, "EURUSD", Direction::Buy).unwrap();
        assert_eq!(venue.refreshed, 1);
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["t1", "t4"]);
        assert!(results.values().all(CloseAttempt::is_closed));
    }

    #[test]
    fn one_rejection_does_not_abort_the_batch() {
        let mut venue = StubVenue::default()
            .with("t1", 1, "EURUSD", Direction::Sell)
            .with("t2", 2, "EURUSD", Direction::Sell)
            .with("t3", 3, "EURUSD", Direction::Sell);
        venue.refuse.insert(2);

        let results = close_open_positions(&mut venue, "EURUSD", Direction::Sell).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results["t1"].is_closed());
        assert_eq!(
            results["t2"],
            CloseAttempt::Rejected("Exception: transaction rejected: order 2 locked".into())
        );
        assert!(results["t3"].is_closed());
    }

    #[test]
    fn close_with_no_matches_is_empty() {
        let mut venue = StubVenue::default().with("t1", 1, "EURUSD", Direction::Buy);
        let results = close_open_positions(&mut venue, "EURUSD", Direction::Sell).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn close_propagates_refresh_failure() {
        let mut venue = StubVenue {
            offline: true,
            ..Default::default()
        };
        assert!(close_open_positions(&mut venue, "EURUSD", Direction::Buy).is_err());
    }

    #[test]
    fn store_trade_rec_rotates_snapshot() {
        let cache = MemoryCache::new();
        let store = SnapshotDiffStore::new(&cache);
        let mut venue = StubVenue::default().with("t1", 1, "EURUSD", Direction::Buy);

        store_trade_rec(&mut venue, &store, "demo-1").unwrap();
        venue.live.clear();
        let mut venue = venue.with("t2", 2, "EURUSD", Direction::Sell);
        let pair = store_trade_rec(&mut venue, &store, "demo-1").unwrap().unwrap();

        assert_eq!(pair.diff().opened, vec!["t2"]);
        assert_eq!(pair.diff().closed, vec!["t1"]);
        assert_eq!(pair.cur["t2"]["mode"], "sell");
        assert_eq!(store.load_pair("demo-1").unwrap(), pair);
    }

    #[test]
    fn store_trade_rec_skips_empty_live_set() {
        let cache = MemoryCache::new();
        let store = SnapshotDiffStore::new(&cache);
        let mut venue = StubVenue::default();

        assert_eq!(store_trade_rec(&mut venue, &store, "demo-1").unwrap(), None);
        assert_eq!(venue.refreshed, 1);
        assert!(cache.is_empty());
    }
}
