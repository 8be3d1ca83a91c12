//! Per-instrument trade ledger.
//!
//! Records are append-only and kept in open order. Closing a direction closes
//! every open trade of that direction at once; there is no lot matching.

use chrono::FixedOffset;
use std::sync::Arc;

use super::error::LedgerError;
use super::performance::{self, Performance, ReportRow};
use super::trade::{realized_profit, Direction, OrderSequence, Trade};

#[derive(Debug)]
pub struct Ledger {
    symbol: String,
    digits: u32,
    volume: f64,
    records: Vec<Trade>,
    performance: Option<Performance>,
    report: Vec<ReportRow>,
    sequence: Arc<OrderSequence>,
    display_offset: FixedOffset,
}

impl Ledger {
    /// A ledger with its own order-id sequence starting at 1.
    pub fn new(symbol: impl Into<String>, digits: u32, volume: f64) -> Self {
        Self::with_sequence(symbol, digits, volume, Arc::new(OrderSequence::new()))
    }

    pub fn with_sequence(
        symbol: impl Into<String>,
        digits: u32,
        volume: f64,
        sequence: Arc<OrderSequence>,
    ) -> Self {
        Ledger {
            symbol: symbol.into(),
            digits,
            volume,
            records: Vec::new(),
            performance: None,
            report: Vec::new(),
            sequence,
            display_offset: performance::default_display_offset(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Price precision; profit is scaled by `10^digits`.
    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Volume given to every trade this ledger opens.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_display_offset(&mut self, offset: FixedOffset) {
        self.display_offset = offset;
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Record a new trade at the ledger's volume. Same-direction trades stack.
    pub fn open_trade(&mut self, direction: Direction, open_time_ms: i64, open_price: f64) -> &Trade {
        let trade = Trade::new(
            self.sequence.next_id(),
            open_time_ms,
            self.symbol.clone(),
            direction,
            self.volume,
            open_price,
        );
        self.records.push(trade);
        &self.records[self.records.len() - 1]
    }

    /// Close every open trade in `direction` at one price and time.
    ///
    /// Returns the number of trades closed; zero when none were open.
    pub fn close_trade(&mut self, direction: Direction, close_time_ms: i64, close_price: f64) -> usize {
        let digits = self.digits;
        let mut closed = 0;
        for tx in self
            .records
            .iter_mut()
            .filter(|tx| tx.direction() == direction && !tx.is_closed())
        {
            let profit = realized_profit(tx.open_price(), close_price, digits, tx.volume(), direction);
            if tx.close(close_time_ms, close_price, profit) {
                closed += 1;
            }
        }
        closed
    }

    pub fn records(&self) -> &[Trade] {
        &self.records
    }

    pub fn find(&self, order_id: u64) -> Option<&Trade> {
        self.records.iter().find(|tx| tx.order_id() == order_id)
    }

    pub fn open_trades(&self) -> impl Iterator<Item = &Trade> {
        self.records.iter().filter(|tx| !tx.is_closed())
    }

    pub fn closed_trades(&self) -> impl Iterator<Item = &Trade> {
        self.records.iter().filter(|tx| tx.is_closed())
    }

    /// Recompute the summary and report table from every record.
    ///
    /// On error the previously computed values are kept.
    pub fn eval_performance(&mut self) -> Result<&Performance, LedgerError> {
        let (performance, report) =
            performance::evaluate(&self.symbol, &self.records, self.display_offset)?;
        self.report = report;
        Ok(self.performance.insert(performance))
    }

    /// Last computed summary; stale after any open or close.
    pub fn performance(&self) -> Option<&Performance> {
        self.performance.as_ref()
    }

    pub fn report(&self) -> &[ReportRow] {
        &self.report
    }
}
