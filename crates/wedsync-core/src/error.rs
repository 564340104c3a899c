//! Core error types for wedsync-core.
//!
//! Detection and synthesis are total and never fail. The types here cover
//! the edges of the engine: loading configuration, strict event
//! construction, session misuse, and host callback failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for wedsync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Conflict session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Host callback errors
    #[error("Host error: {0}")]
    Host(#[from] HostError),

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

    /// Unknown dot-separated configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// No home directory to derive the default config location from
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },
}

/// Errors raised by the conflict session for caller mistakes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No conflict with this id in the current list
    #[error("Unknown conflict: {0}")]
    UnknownConflict(String),

    /// The conflict was already marked resolved
    #[error("Conflict {0} is already resolved")]
    AlreadyResolved(String),

    /// The supplied proposal belongs to a different conflict
    #[error("Proposal for {proposal} cannot resolve conflict {conflict}")]
    ProposalMismatch { conflict: String, proposal: String },
}

/// Errors reported by a [`TimelineHost`](crate::conflict::TimelineHost) callback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host has no event with this id
    #[error("Event not found: {0}")]
    UnknownEvent(String),

    /// The host has no update path wired up
    #[error("Event update callback unavailable")]
    Unavailable,

    /// Any other host-side failure
    #[error("{0}")]
    Rejected(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
