//! Core error types for chronotask-core.
//!
//! Errors raised inside a running session (a missing task during a flush, a
//! notification backend that is unavailable) are logged and absorbed by the
//! caller. Only load-time structural errors reach the user.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for chronotask-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A task id has no matching record, or there is no open history
    /// session to finalize.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Desktop notification or sound playback failed.
    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),

    /// The task store exists on disk but cannot be parsed.
    #[error("Malformed task store at {path}: {source}")]
    MalformedState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// The display id was not assigned by the last `list`
    #[error("No task with ID {0} in the last listing")]
    UnknownDisplayId(u32),

    /// Status change that would be a no-op
    #[error("Task {id} is already {status}")]
    InvalidStatusTransition { id: String, status: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
