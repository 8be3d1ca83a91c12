//! Core domain types and logic.

pub mod trade;
pub mod ledger;
pub mod performance;
pub mod portfolio;
pub mod snapshot;
pub mod execution;
pub mod config_validation;
pub mod error;
