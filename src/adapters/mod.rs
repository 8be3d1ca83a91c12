//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_cache;
#[cfg(feature = "redis")]
pub mod redis_cache;
