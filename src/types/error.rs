//! Unified error types for the dashboard engine
//!
//! Errors are serializable so a frontend can consume them directly.
//! The taxonomy mirrors how failures are handled:
//! - `Validation` is surfaced immediately, never retried
//! - `Network` triggers fallback data or a bounded retry
//! - `Server` is terminal for the operation that hit it

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine error type for gateway and orchestration operations
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SmsError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("{0}")]
    Other(String),
}

// Implement From for common error types

impl From<std::io::Error> for SmsError {
    fn from(err: std::io::Error) -> Self {
        SmsError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SmsError {
    fn from(err: toml::de::Error) -> Self {
        SmsError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SmsError {
    fn from(err: serde_json::Error) -> Self {
        SmsError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for SmsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SmsError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            SmsError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            SmsError::Server(err.to_string())
        } else {
            SmsError::Network(err.to_string())
        }
    }
}

/// Result type alias using SmsError
pub type Result<T> = std::result::Result<T, SmsError>;
