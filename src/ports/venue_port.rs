//! Trading venue port trait.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::VenueError;
use crate::domain::trade::Direction;

/// A live position as reported by the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveTransaction {
    pub order_id: u64,
    pub symbol: String,
    pub mode: Direction,
    pub volume: f64,
    pub open_price: f64,
    pub open_time_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionHandle {
    pub order_id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseOutcome {
    pub order_id: u64,
    pub close_price: f64,
}

pub trait VenuePort {
    fn open_trade(
        &mut self,
        direction: Direction,
        symbol: &str,
        volume: f64,
        rate_tp: f64,
        rate_sl: f64,
    ) -> Result<PositionHandle, VenueError>;

    fn close_trade_only(&mut self, order_id: u64) -> Result<CloseOutcome, VenueError>;

    /// Refresh [`trade_rec`](Self::trade_rec) from the venue.
    fn update_trades(&mut self) -> Result<(), VenueError>;

    /// Live positions keyed by the venue's transaction key.
    fn trade_rec(&self) -> &BTreeMap<String, LiveTransaction>;
}
