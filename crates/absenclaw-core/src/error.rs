//! Absenclaw error type.

use thiserror::Error;

/// All errors produced by absenclaw crates.
#[derive(Debug, Error)]
pub enum AbsenError {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(String),

    /// Messaging endpoint error (connect/send/probe).
    #[error("Channel error: {0}")]
    Channel(String),

    /// Endpoint reported a terminal logout/auth failure.
    #[error("Auth failed: {0}")]
    AuthFailed(String),

    /// Network call exceeded its bounded timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Task source (sheet API) error.
    #[error("Sheet error: {0}")]
    Sheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AbsenError>;
