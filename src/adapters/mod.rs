//! Concrete adapter implementations for ports.

pub mod clock_calendar_adapter;
pub mod csv_provider_adapter;
pub mod csv_store_adapter;
pub mod file_config_adapter;
pub mod file_signal_log_adapter;
pub mod file_universe_adapter;
