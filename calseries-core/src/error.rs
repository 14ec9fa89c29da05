//! Error types for the calseries engine.

use thiserror::Error;

/// Errors that can occur in calseries operations.
#[derive(Error, Debug)]
pub enum CalSeriesError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid anchor date '{0}'. Expected YYYY-MM-DD")]
    InvalidAnchor(String),

    #[error("Event not found: {0}")]
    NotFound(String),

    #[error("Invalid scope '{0}'. Expected one of: this, future, all")]
    InvalidScope(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calseries operations.
pub type CalSeriesResult<T> = Result<T, CalSeriesError>;
