//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The speech output event loop is no longer running
    #[error("Speech output service has stopped")]
    ServiceStopped,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Check if this error means the caller should stop submitting work
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::ServiceStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_convert_transparently() {
        let err: ApplicationError = DomainError::UnknownCommand("foo".into()).into();
        assert_eq!(err.to_string(), DomainError::UnknownCommand("foo".into()).to_string());
        assert!(!err.is_terminal());
    }

    #[test]
    fn stopped_service_is_terminal() {
        assert!(ApplicationError::ServiceStopped.is_terminal());
        assert!(!ApplicationError::Configuration("x".into()).is_terminal());
    }
}
