//! CSV trade log reader and performance report writer.
//!
//! Trade log columns: `time_ms,action,direction,price` where `action` is
//! `open` or `close`. Events are replayed into a ledger in file order.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::path::Path;

use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::trade::Direction;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub time_ms: i64,
    pub action: TradeAction,
    pub direction: Direction,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub opened: usize,
    pub closed: usize,
}

fn log_error(line: usize, reason: impl Display) -> LedgerError {
    LedgerError::TradeLog {
        reason: format!("line {line}: {reason}"),
    }
}

pub fn parse_trade_log(content: &str) -> Result<Vec<TradeEvent>, LedgerError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut events = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| log_error(line, format!("CSV parse error: {e}")))?;

        let time_ms: i64 = record
            .get(0)
            .ok_or_else(|| log_error(line, "missing time_ms column"))?
            .parse()
            .map_err(|e| log_error(line, format!("invalid time_ms: {e}")))?;

        let action = match record
            .get(1)
            .ok_or_else(|| log_error(line, "missing action column"))?
            .to_lowercase()
            .as_str()
        {
            "open" => TradeAction::Open,
            "close" => TradeAction::Close,
            other => return Err(log_error(line, format!("unknown action '{other}'"))),
        };

        let direction: Direction = record
            .get(2)
            .ok_or_else(|| log_error(line, "missing direction column"))?
            .parse()
            .map_err(|e: String| log_error(line, e))?;

        let price: f64 = record
            .get(3)
            .ok_or_else(|| log_error(line, "missing price column"))?
            .parse()
            .map_err(|e| log_error(line, format!("invalid price: {e}")))?;
        if price <= 0.0 {
            return Err(log_error(line, "price must be positive"));
        }

        events.push(TradeEvent {
            time_ms,
            action,
            direction,
            price,
        });
    }

    Ok(events)
}

pub fn replay(ledger: &mut Ledger, events: &[TradeEvent]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for event in events {
        match event.action {
            TradeAction::Open => {
                ledger.open_trade(event.direction, event.time_ms, event.price);
                summary.opened += 1;
            }
            TradeAction::Close => {
                summary.closed += ledger.close_trade(event.direction, event.time_ms, event.price);
            }
        }
    }
    summary
}

pub fn load_trade_log<P: AsRef<Path>>(
    path: P,
    ledger: &mut Ledger,
) -> Result<ReplaySummary, LedgerError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| LedgerError::TradeLog {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    let events = parse_trade_log(&content)?;
    Ok(replay(ledger, &events))
}

const REPORT_HEADER: [&str; 14] = [
    "order_id",
    "mode",
    "cmd",
    "volume",
    "open_price",
    "close_price",
    "profit",
    "cum_profit",
    "open_ctm",
    "close_ctm",
    "open_utc",
    "close_utc",
    "open_time",
    "close_time",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn stamp<Tz: TimeZone>(value: Option<DateTime<Tz>>) -> String
where
    Tz::Offset: Display,
{
    value.map(|t| t.to_rfc3339()).unwrap_or_default()
}

/// Render the ledger's last evaluated report as CSV.
pub fn render_report(ledger: &Ledger) -> Result<String, LedgerError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let to_err = |e: csv::Error| LedgerError::TradeLog {
        reason: format!("CSV write error: {e}"),
    };

    wtr.write_record(REPORT_HEADER).map_err(to_err)?;
    for row in ledger.report() {
        wtr.write_record([
            row.order_id.to_string(),
            (row.direction as i8).to_string(),
            row.cmd.to_string(),
            row.volume.to_string(),
            row.open_price.to_string(),
            opt(row.close_price),
            row.profit.to_string(),
            row.cum_profit.to_string(),
            row.open_time_ms.to_string(),
            opt(row.close_time_ms),
            stamp(row.open_utc),
            stamp(row.close_utc),
            stamp(row.open_local),
            stamp(row.close_local),
        ])
        .map_err(to_err)?;
    }

    let bytes = wtr.into_inner().map_err(|e| LedgerError::TradeLog {
        reason: format!("CSV flush error: {e}"),
    })?;
    String::from_utf8(bytes).map_err(|e| LedgerError::TradeLog {
        reason: format!("CSV encoding error: {e}"),
    })
}

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(&self, ledger: &Ledger, output_path: &str) -> Result<(), LedgerError> {
        let content = render_report(ledger)?;
        fs::write(output_path, content)?;
        Ok(())
    }
}
