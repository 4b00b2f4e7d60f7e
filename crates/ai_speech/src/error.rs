//! Speech synthesis errors

use thiserror::Error;

/// Errors that can occur during speech synthesis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// Failed to connect to the synthesis service
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request was rejected below the HTTP layer
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Timeout during synthesis
    #[error("Speech synthesis timeout after {0}ms")]
    Timeout(u64),

    /// Service answered with a non-success status
    #[error("Synthesis service returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Invalid or empty response from service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Nothing to synthesize
    #[error("Text cannot be empty")]
    EmptyText,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SpeechError {
    /// Whether the call never produced an HTTP response
    pub const fn is_network(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::RequestFailed(_) | Self::Timeout(_)
        )
    }

    /// HTTP status code if the service answered with one
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(30000)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
