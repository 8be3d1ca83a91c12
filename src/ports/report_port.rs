//! Report generation port trait.

use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;

/// Port for writing a ledger's evaluated performance report.
pub trait ReportPort {
    fn write(&self, ledger: &Ledger, output_path: &str) -> Result<(), LedgerError>;
}
