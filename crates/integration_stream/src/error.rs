//! Push-stream errors

use thiserror::Error;

/// Errors reported by the stream client
///
/// None of these are fatal: each one is handed to the listener and, when
/// reconnection is enabled, followed by a backoff and a fresh connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Could not establish the connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Server refused the stream with a non-success status
    #[error("Stream rejected with HTTP {0}")]
    Status(u16),

    /// Reading from an open stream failed
    #[error("Stream read failed: {0}")]
    Read(String),

    /// Server ended the stream
    #[error("Stream ended by server")]
    Ended,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::ConnectionFailed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Read(err.to_string())
        }
    }
}
