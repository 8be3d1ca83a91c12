//! Domain error types.

/// Failure reported by a cache backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cache backend error: {reason}")]
pub struct CacheError {
    pub reason: String,
}

impl CacheError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure reported by the trading venue.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VenueError {
    /// Business-rule violation on the venue side (insufficient margin, market closed, ...).
    #[error("transaction rejected: {reason}")]
    Rejected { reason: String },

    #[error("venue unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Top-level error type for fxledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("ledger {symbol} has no trades to evaluate")]
    EmptyLedger { symbol: String },

    #[error("ledger {symbol} has no closed trades to evaluate")]
    NoClosedTrades { symbol: String },

    #[error("ledger {symbol} spans {days} days of entries, need a positive span")]
    ZeroTimespan { symbol: String, days: f64 },

    #[error("portfolio already tracks {symbol}")]
    DuplicateSymbol { symbol: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Venue(#[from] VenueError),

    #[error("trade log error: {reason}")]
    TradeLog { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&LedgerError> for std::process::ExitCode {
    fn from(err: &LedgerError) -> Self {
        let code: u8 = match err {
            LedgerError::Io(_) => 1,
            LedgerError::ConfigParse { .. }
            | LedgerError::ConfigMissing { .. }
            | LedgerError::ConfigInvalid { .. } => 2,
            LedgerError::Cache(_) | LedgerError::Venue(_) => 3,
            LedgerError::TradeLog { .. } => 4,
            LedgerError::EmptyLedger { .. }
            | LedgerError::NoClosedTrades { .. }
            | LedgerError::ZeroTimespan { .. }
            | LedgerError::DuplicateSymbol { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
