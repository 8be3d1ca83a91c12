//! Port traits for the ledger's external collaborators.

pub mod cache_port;
pub mod config_port;
pub mod report_port;
pub mod venue_port;
