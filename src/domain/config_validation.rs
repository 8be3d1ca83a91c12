//! Trading settings and their validation.
//!
//! Settings come from the `[trading]`, `[cache]` and `[report]` sections.

use chrono::FixedOffset;

use crate::domain::error::LedgerError;
use crate::domain::performance::{self, DEFAULT_UTC_OFFSET_HOURS};
use crate::domain::snapshot::SNAPSHOT_TTL_SECONDS;
use crate::ports::config_port::ConfigPort;

const DEFAULT_TIMEFRAME: i64 = 15;
const DEFAULT_DIGITS: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub algorithm: String,
    pub timeframe: i64,
    pub symbols: Vec<String>,
    pub volume: f64,
    pub rate_tp: f64,
    pub rate_sl: f64,
    pub digits: u32,
    pub account: Option<String>,
    pub cache_ttl_seconds: u64,
    pub utc_offset_hours: i32,
}

impl Settings {
    /// Validate `config` and build the settings from it.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LedgerError> {
        validate_settings(config)?;
        Ok(Settings {
            algorithm: config
                .get_string("trading", "algorithm")
                .unwrap_or_else(|| "rsi".to_string()),
            timeframe: config.get_int("trading", "timeframe", DEFAULT_TIMEFRAME)?,
            symbols: config.get_list("trading", "symbols"),
            volume: config.get_double("trading", "volume", 0.0)?,
            rate_tp: config.get_double("trading", "rate_tp", 0.0)?,
            rate_sl: config.get_double("trading", "rate_sl", 0.0)?,
            digits: config.get_int("trading", "digits", DEFAULT_DIGITS)? as u32,
            account: config
                .get_string("trading", "account")
                .filter(|s| !s.trim().is_empty()),
            cache_ttl_seconds: config.get_int("cache", "ttl_seconds", SNAPSHOT_TTL_SECONDS as i64)?
                as u64,
            utc_offset_hours: config.get_int(
                "report",
                "utc_offset_hours",
                DEFAULT_UTC_OFFSET_HOURS as i64,
            )? as i32,
        })
    }

    pub fn display_offset(&self) -> FixedOffset {
        performance::display_offset(self.utc_offset_hours)
            .unwrap_or_else(performance::default_display_offset)
    }
}

pub fn validate_settings(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    validate_symbols(config)?;
    validate_volume(config)?;
    validate_rates(config)?;
    validate_timeframe(config)?;
    validate_digits(config)?;
    validate_ttl(config)?;
    validate_utc_offset(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> LedgerError {
    LedgerError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    if config.get_list("trading", "symbols").is_empty() {
        return Err(LedgerError::ConfigMissing {
            section: "trading".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(())
}

fn validate_volume(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    if config.get_string("trading", "volume").is_none() {
        return Err(LedgerError::ConfigMissing {
            section: "trading".to_string(),
            key: "volume".to_string(),
        });
    }
    if config.get_double("trading", "volume", 0.0)? <= 0.0 {
        return Err(invalid("trading", "volume", "volume must be positive"));
    }
    Ok(())
}

fn validate_rates(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    for key in ["rate_tp", "rate_sl"] {
        if config.get_double("trading", key, 0.0)? < 0.0 {
            return Err(invalid("trading", key, &format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    if config.get_int("trading", "timeframe", DEFAULT_TIMEFRAME)? <= 0 {
        return Err(invalid("trading", "timeframe", "timeframe must be positive"));
    }
    Ok(())
}

fn validate_digits(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    let digits = config.get_int("trading", "digits", DEFAULT_DIGITS)?;
    if !(0..=10).contains(&digits) {
        return Err(invalid("trading", "digits", "digits must be between 0 and 10"));
    }
    Ok(())
}

fn validate_ttl(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    if config.get_int("cache", "ttl_seconds", SNAPSHOT_TTL_SECONDS as i64)? <= 0 {
        return Err(invalid("cache", "ttl_seconds", "ttl_seconds must be positive"));
    }
    Ok(())
}

fn validate_utc_offset(config: &dyn ConfigPort) -> Result<(), LedgerError> {
    let hours = config.get_int("report", "utc_offset_hours", DEFAULT_UTC_OFFSET_HOURS as i64)?;
    if !(-14..=14).contains(&hours) {
        return Err(invalid(
            "report",
            "utc_offset_hours",
            "utc_offset_hours must be between -14 and 14",
        ));
    }
    Ok(())
}
