//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Frame body was not valid JSON or had no string `type`
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The command type is not a speech command
    #[error("Unknown command type: {0}")]
    UnknownCommand(String),

    /// The payload did not match the shape required by the command type
    #[error("Invalid {command} payload: {reason}")]
    InvalidPayload {
        /// Wire name of the command
        command: &'static str,
        /// What was wrong with the payload
        reason: String,
    },
}

impl DomainError {
    /// Create an invalid payload error
    pub fn invalid_payload(command: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            command,
            reason: reason.into(),
        }
    }

    /// Whether this error only means "not a speech command"
    pub const fn is_unknown_command(&self) -> bool {
        matches!(self, Self::UnknownCommand(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_payload_creates_correct_error() {
        let err = DomainError::invalid_payload("speech.start", "missing utterance_id");
        match err {
            DomainError::InvalidPayload { command, reason } => {
                assert_eq!(command, "speech.start");
                assert_eq!(reason, "missing utterance_id");
            },
            _ => unreachable!("Expected InvalidPayload error"),
        }
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            DomainError::MalformedFrame("eof".to_string()).to_string(),
            "Malformed frame: eof"
        );
        assert_eq!(
            DomainError::UnknownCommand("chat.delta".to_string()).to_string(),
            "Unknown command type: chat.delta"
        );
        assert_eq!(
            DomainError::invalid_payload("speak", "text must be a string").to_string(),
            "Invalid speak payload: text must be a string"
        );
    }

    #[test]
    fn unknown_command_classification() {
        assert!(DomainError::UnknownCommand("x".to_string()).is_unknown_command());
        assert!(!DomainError::invalid_payload("speak", "x").is_unknown_command());
    }
}
