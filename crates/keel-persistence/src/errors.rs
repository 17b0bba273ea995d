//! Error helpers for keel-persistence
//!
//! Wraps keel-core ExError with persistence-specific constructors

use keel_core::errors::{ExError, ExErrorKind, KeelError};

pub use keel_core::errors::Result;

/// The container cannot build `class` with the current configuration
pub fn not_configured(class: &str) -> ExError {
    KeelError::ServiceNotConfigured {
        class: class.to_string(),
    }
    .into()
}

/// Settings name a driver this build does not provide
pub fn unsupported_driver(what: &str, driver: &str) -> ExError {
    KeelError::UnsupportedDriver {
        what: what.to_string(),
        driver: driver.to_string(),
    }
    .into()
}

/// Settings at `path` exist but cannot be used
pub fn invalid_settings(path: &str, reason: impl Into<String>) -> ExError {
    KeelError::InvalidSettings {
        path: path.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// A built-in command could not complete
pub fn command_failed(name: &str, reason: impl Into<String>) -> ExError {
    KeelError::CommandFailed {
        name: name.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
