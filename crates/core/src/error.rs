//! Error types for login orchestration.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for egc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while driving the login journey.
///
/// Only [`crate::login::LoginFlow`] decides which of these are fatal; every
/// error that reaches its failure boundary becomes an
/// [`AttemptOutcome::Failure`](crate::login::AttemptOutcome::Failure).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Expected element '{selector}' to be visible, but it was not visible after {timeout:?}")]
    ElementNotVisible { selector: String, timeout: Duration },

    #[error("Timeout after {ms}ms waiting for {condition}")]
    Timeout { ms: u64, condition: String },

    #[error("Challenge resolution failed: {0}")]
    Challenge(String),

    #[error("Invalid TOTP secret: {0}")]
    Totp(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signal queue closed: {0}")]
    SignalClosed(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Builds a [`Error::Timeout`] from the bound that expired.
    pub fn timeout(bound: Duration, condition: impl Into<String>) -> Self {
        Self::Timeout {
            ms: bound.as_millis() as u64,
            condition: condition.into(),
        }
    }
}
