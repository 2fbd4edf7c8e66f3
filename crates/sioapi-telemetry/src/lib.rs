//! Logging infrastructure for sioapi.
//!
//! This crate provides:
//! - Structured JSON (or pretty) logging to stderr, filtered by `RUST_LOG`
//! - Standard event names and macros that keep field names consistent
//!
//! # Usage
//!
//! ```ignore
//! use sioapi_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::new().with_log_level("debug");
//! init_logging(&config)?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::{events, init_logging};

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The configured log level is not a valid filter directive.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "sioapi");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.ansi);
    }

    #[test]
    fn test_config_builder() {
        let config = TelemetryConfig::new()
            .with_service_name("downloader")
            .with_log_level("debug")
            .with_log_format(LogFormat::Pretty)
            .with_ansi(false);

        assert_eq!(config.service_name, "downloader");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.ansi);
    }

    #[test]
    fn test_invalid_filter_rejected() {
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig::new().with_log_level("sioapi=loud");
        assert!(matches!(
            logging::build_filter(&config),
            Err(TelemetryError::InvalidFilter(_))
        ));
    }
}
