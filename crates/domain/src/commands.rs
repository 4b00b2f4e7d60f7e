//! Speech commands - Strongly typed representations of server speech frames

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::DomainError;
use crate::messages::ServerMessage;
use crate::value_objects::{ChatRequestId, UtteranceId};

/// Wire names of the speech commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechCommandKind {
    /// `speech.start`
    Start,
    /// `speech.segment`
    Segment,
    /// `speech.end`
    End,
    /// `speak` (legacy, unsegmented)
    Speak,
    /// `stop_output`
    StopOutput,
}

impl SpeechCommandKind {
    /// Look up a command kind by its wire name
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "speech.start" => Some(Self::Start),
            "speech.segment" => Some(Self::Segment),
            "speech.end" => Some(Self::End),
            "speak" => Some(Self::Speak),
            "stop_output" => Some(Self::StopOutput),
            _ => None,
        }
    }

    /// The wire name of this command kind
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Start => "speech.start",
            Self::Segment => "speech.segment",
            Self::End => "speech.end",
            Self::Speak => "speak",
            Self::StopOutput => "stop_output",
        }
    }
}

/// A validated speech command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechCommand {
    /// A segmented utterance begins
    Start {
        /// Utterance being started
        utterance_id: UtteranceId,
        /// Chat request the utterance answers
        chat_request_id: ChatRequestId,
    },

    /// One ordered chunk of a segmented utterance
    Segment {
        /// Owning utterance
        utterance_id: UtteranceId,
        /// Owning chat request
        chat_request_id: ChatRequestId,
        /// Position within the utterance, starting at 0
        index: u32,
        /// Text to synthesize
        text: String,
        /// Whether this is the final segment
        is_last: bool,
    },

    /// No more segments will follow for this utterance
    End {
        /// Utterance being closed
        utterance_id: UtteranceId,
        /// Owning chat request
        chat_request_id: ChatRequestId,
    },

    /// Legacy full-text utterance
    Speak {
        /// Identifier shared with the segmented path for de-duplication
        say_id: UtteranceId,
        /// Full text to synthesize
        text: String,
    },

    /// Silence everything immediately
    StopOutput,
}

#[derive(Deserialize)]
struct UtterancePayload {
    utterance_id: String,
    chat_request_id: String,
}

#[derive(Deserialize)]
struct SegmentPayload {
    utterance_id: String,
    chat_request_id: String,
    segment_index: u32,
    text: String,
    is_last: bool,
}

#[derive(Deserialize)]
struct SpeakPayload {
    say_id: String,
    text: String,
}

fn payload<T: DeserializeOwned>(kind: SpeechCommandKind, data: &Value) -> Result<T, DomainError> {
    // Structs would otherwise also deserialize from JSON arrays
    if !data.is_object() {
        return Err(DomainError::invalid_payload(
            kind.wire_name(),
            "payload must be an object",
        ));
    }
    T::deserialize(data).map_err(|e| DomainError::invalid_payload(kind.wire_name(), e.to_string()))
}

impl SpeechCommand {
    /// Parse a command from its wire type and payload
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownCommand` if `kind` is not a speech command,
    /// or `DomainError::InvalidPayload` if the payload has the wrong shape.
    pub fn parse(kind: &str, data: &Value) -> Result<Self, DomainError> {
        let Some(kind) = SpeechCommandKind::from_wire(kind) else {
            return Err(DomainError::UnknownCommand(kind.to_string()));
        };

        match kind {
            SpeechCommandKind::Start => {
                let p: UtterancePayload = payload(kind, data)?;
                Ok(Self::Start {
                    utterance_id: p.utterance_id.into(),
                    chat_request_id: ChatRequestId::new(p.chat_request_id),
                })
            },
            SpeechCommandKind::Segment => {
                let p: SegmentPayload = payload(kind, data)?;
                Ok(Self::Segment {
                    utterance_id: p.utterance_id.into(),
                    chat_request_id: ChatRequestId::new(p.chat_request_id),
                    index: p.segment_index,
                    text: p.text,
                    is_last: p.is_last,
                })
            },
            SpeechCommandKind::End => {
                let p: UtterancePayload = payload(kind, data)?;
                Ok(Self::End {
                    utterance_id: p.utterance_id.into(),
                    chat_request_id: ChatRequestId::new(p.chat_request_id),
                })
            },
            SpeechCommandKind::Speak => {
                let p: SpeakPayload = payload(kind, data)?;
                Ok(Self::Speak {
                    say_id: p.say_id.into(),
                    text: p.text,
                })
            },
            SpeechCommandKind::StopOutput => Ok(Self::StopOutput),
        }
    }

    /// Parse a command from a stream message
    ///
    /// # Errors
    ///
    /// See [`SpeechCommand::parse`].
    pub fn from_message(message: &ServerMessage) -> Result<Self, DomainError> {
        Self::parse(&message.kind, &message.data)
    }

    /// The kind of this command
    pub const fn kind(&self) -> SpeechCommandKind {
        match self {
            Self::Start { .. } => SpeechCommandKind::Start,
            Self::Segment { .. } => SpeechCommandKind::Segment,
            Self::End { .. } => SpeechCommandKind::End,
            Self::Speak { .. } => SpeechCommandKind::Speak,
            Self::StopOutput => SpeechCommandKind::StopOutput,
        }
    }

    /// The utterance this command refers to, if any
    pub const fn utterance_id(&self) -> Option<&UtteranceId> {
        match self {
            Self::Start { utterance_id, .. }
            | Self::Segment { utterance_id, .. }
            | Self::End { utterance_id, .. } => Some(utterance_id),
            Self::Speak { say_id, .. } => Some(say_id),
            Self::StopOutput => None,
        }
    }
}
