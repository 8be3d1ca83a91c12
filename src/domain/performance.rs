//! Performance statistics and the tabular trade report.
//!
//! Statistics are computed in explicit passes over the trade list in record
//! (entry) order. Still-open trades contribute a profit of zero.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use super::error::LedgerError;
use super::trade::{Direction, Trade};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Offset used for local display timestamps (UTC+7).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub win_rate: f64,
    pub n_win_pos: usize,
    pub n_loss_pos: usize,
    pub total_position: usize,
    pub total_pnl: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub max_dd: f64,
    pub max_runup: f64,
    pub timespan_day: f64,
    pub avg_open_per_day: f64,
}

/// One row of the performance report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub order_id: u64,
    pub direction: Direction,
    pub cmd: &'static str,
    pub volume: f64,
    pub open_price: f64,
    pub close_price: Option<f64>,
    pub profit: f64,
    pub cum_profit: f64,
    pub open_time_ms: i64,
    pub close_time_ms: Option<i64>,
    pub open_utc: Option<DateTime<Utc>>,
    pub close_utc: Option<DateTime<Utc>>,
    pub open_local: Option<DateTime<FixedOffset>>,
    pub close_local: Option<DateTime<FixedOffset>>,
}

pub fn display_offset(hours: i32) -> Option<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
}

pub fn default_display_offset() -> FixedOffset {
    display_offset(DEFAULT_UTC_OFFSET_HOURS).unwrap_or_else(|| Utc.fix())
}

fn to_utc(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Evaluate a ledger's records.
///
/// Fails on an empty ledger, a ledger with no closed trade, or a ledger whose
/// entries do not span a positive amount of time.
pub fn evaluate(
    symbol: &str,
    records: &[Trade],
    offset: FixedOffset,
) -> Result<(Performance, Vec<ReportRow>), LedgerError> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(LedgerError::EmptyLedger {
                symbol: symbol.to_string(),
            });
        }
    };
    if !records.iter().any(|tx| tx.is_closed()) {
        return Err(LedgerError::NoClosedTrades {
            symbol: symbol.to_string(),
        });
    }

    let timespan_day = (last.open_time_ms() - first.open_time_ms()) as f64 / MS_PER_DAY;
    if timespan_day <= 0.0 {
        return Err(LedgerError::ZeroTimespan {
            symbol: symbol.to_string(),
            days: timespan_day,
        });
    }

    let rows = build_rows(records, offset);

    let mut n_win_pos = 0usize;
    let mut n_loss_pos = 0usize;
    let mut total_pnl = 0.0_f64;
    let mut total_profit = 0.0_f64;
    let mut total_loss = 0.0_f64;
    for tx in records {
        total_pnl += tx.profit();
        if tx.profit() > 0.0 {
            n_win_pos += 1;
            total_profit += tx.profit();
        } else if tx.profit() < 0.0 {
            n_loss_pos += 1;
            total_loss += tx.profit();
        }
    }

    let max_dd = rows
        .iter()
        .map(|row| row.cum_profit)
        .fold(f64::INFINITY, f64::min);
    let max_runup = rows
        .iter()
        .map(|row| row.cum_profit)
        .fold(f64::NEG_INFINITY, f64::max);

    let total_position = records.len();
    let performance = Performance {
        win_rate: n_win_pos as f64 / total_position as f64,
        n_win_pos,
        n_loss_pos,
        total_position,
        total_pnl,
        total_profit,
        total_loss,
        max_dd,
        max_runup,
        timespan_day,
        avg_open_per_day: total_position as f64 / timespan_day,
    };

    Ok((performance, rows))
}

fn build_rows(records: &[Trade], offset: FixedOffset) -> Vec<ReportRow> {
    let mut cum_profit = 0.0_f64;
    records
        .iter()
        .map(|tx| {
            cum_profit += tx.profit();
            let open_utc = to_utc(tx.open_time_ms());
            let close_utc = tx.close_time_ms().and_then(to_utc);
            ReportRow {
                order_id: tx.order_id(),
                direction: tx.direction(),
                cmd: tx.direction().label(),
                volume: tx.volume(),
                open_price: tx.open_price(),
                close_price: tx.close_price(),
                profit: tx.profit(),
                cum_profit,
                open_time_ms: tx.open_time_ms(),
                close_time_ms: tx.close_time_ms(),
                open_utc,
                close_utc,
                open_local: open_utc.map(|t| t.with_timezone(&offset)),
                close_local: close_utc.map(|t| t.with_timezone(&offset)),
            }
        })
        .collect()
}
