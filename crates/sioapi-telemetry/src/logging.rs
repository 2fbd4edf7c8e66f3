//! Structured logging setup.
//!
//! Log lines go to stderr so that commands printing documents on stdout stay
//! pipeable.

use crate::{LogFormat, TelemetryConfig, TelemetryError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// Sets up tracing-subscriber with either JSON or pretty format,
/// respecting the configured log level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    match config.log_format {
        LogFormat::Json => init_json_logging(filter),
        LogFormat::Pretty => init_pretty_logging(filter, config.ansi),
    }?;

    tracing::debug!(service = %config.service_name, "logging initialized");
    Ok(())
}

/// Build the env filter from `RUST_LOG`, falling back to the configured level.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| TelemetryError::InvalidFilter(format!("{}: {}", config.log_level, e))),
    }
}

fn init_json_logging(filter: EnvFilter) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter, ansi: bool) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A specification document was created.
    pub const DOC_INITIALIZED: &str = "doc_initialized";

    /// An inbound event handler was registered.
    pub const RECEIVER_REGISTERED: &str = "receiver_registered";

    /// An outbound event was documented.
    pub const SENDER_REGISTERED: &str = "sender_registered";

    /// A payload did not match its declared shape.
    pub const VALIDATION_FAILURE: &str = "validation_failure";

    /// A handler failed or its error reached the default error handler.
    pub const HANDLER_ERROR: &str = "handler_error";

    /// The document was rendered to text.
    pub const DOC_RENDERED: &str = "doc_rendered";
}

/// Helper macros for structured logging with standard fields.
///
/// These wrap the tracing macros to ensure consistent field naming.
#[macro_export]
macro_rules! log_doc_initialized {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::DOC_INITIALIZED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_receiver_registered {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::RECEIVER_REGISTERED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_sender_registered {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::SENDER_REGISTERED,
            $($field)*
        )
    };
}

/// Request payloads are client input; logged at `warn`.
#[macro_export]
macro_rules! log_validation_failure {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::VALIDATION_FAILURE,
            $($field)*
        )
    };
}

/// Response and emit payloads are server output; a mismatch is a bug.
#[macro_export]
macro_rules! log_contract_violation {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::VALIDATION_FAILURE,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_handler_error {
    ($($field:tt)*) => {
        tracing::error!(
            event = $crate::logging::events::HANDLER_ERROR,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_doc_rendered {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::DOC_RENDERED,
            $($field)*
        )
    };
}
