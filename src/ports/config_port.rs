//! Configuration access port trait.

use crate::domain::error::LedgerError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `default` when the key is absent; `ConfigInvalid` when it is present
    /// but not an integer.
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, LedgerError>;

    /// `default` when the key is absent; `ConfigInvalid` when it is present
    /// but not a number.
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, LedgerError>;

    /// Comma-separated value, trimmed, empty items dropped.
    fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get_string(section, key)
            .map(|raw| {
                raw.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
