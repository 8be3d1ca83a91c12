//! Trade records, trade direction and the order-id sequence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Signed trade direction. The discriminant is the profit multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy = 1,
    Sell = -1,
}

impl Direction {
    pub fn multiplier(self) -> f64 {
        self as i8 as f64
    }

    pub fn from_mode(mode: i64) -> Option<Self> {
        match mode {
            1 => Some(Direction::Buy),
            -1 => Some(Direction::Sell),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" | "long" | "1" | "+1" => Ok(Direction::Buy),
            "sell" | "short" | "-1" => Ok(Direction::Sell),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

/// Monotonic order-id generator. Ids start at the seed and are never reused.
#[derive(Debug)]
pub struct OrderSequence {
    next: AtomicU64,
}

impl OrderSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`next_id`](Self::next_id) will hand out.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for OrderSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// A single position. Only the close fields ever change, and only once.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    order_id: u64,
    open_time_ms: i64,
    symbol: String,
    direction: Direction,
    volume: f64,
    open_price: f64,
    close_time_ms: Option<i64>,
    close_price: Option<f64>,
    profit: f64,
    closed: bool,
}

impl Trade {
    pub fn new(
        order_id: u64,
        open_time_ms: i64,
        symbol: impl Into<String>,
        direction: Direction,
        volume: f64,
        open_price: f64,
    ) -> Self {
        Trade {
            order_id,
            open_time_ms,
            symbol: symbol.into(),
            direction,
            volume,
            open_price,
            close_time_ms: None,
            close_price: None,
            profit: 0.0,
            closed: false,
        }
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn open_time_ms(&self) -> i64 {
        self.open_time_ms
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn open_price(&self) -> f64 {
        self.open_price
    }

    pub fn close_time_ms(&self) -> Option<i64> {
        self.close_time_ms
    }

    pub fn close_price(&self) -> Option<f64> {
        self.close_price
    }

    /// Realized profit; zero while the trade is open.
    pub fn profit(&self) -> f64 {
        self.profit
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Sets every close field in one step. A closed trade is left untouched.
    pub(crate) fn close(&mut self, close_time_ms: i64, close_price: f64, profit: f64) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        self.close_time_ms = Some(close_time_ms);
        self.close_price = Some(close_price);
        self.profit = profit;
        true
    }
}

/// Realized profit in the instrument's quoted unit.
///
/// `(close - open) * 10^digits * volume * direction`
pub fn realized_profit(
    open_price: f64,
    close_price: f64,
    digits: u32,
    volume: f64,
    direction: Direction,
) -> f64 {
    (close_price - open_price) * 10f64.powi(digits as i32) * volume * direction.multiplier()
}
