//! Speech output - ordered synthesis and playback of spoken responses

mod config;
mod history;
mod pipeline;
mod service;
mod unlock_gate;
mod utterance;

pub use config::SpeechOutputConfig;
pub use history::UtteranceHistory;
pub use pipeline::{Effect, PlaybackTarget, SpeechPipeline, SynthesisTicket};
pub use service::{SpeechInput, SpeechOutputHandle, SpeechOutputService};
pub use unlock_gate::{PendingItem, UnlockGate};
pub use utterance::{SegmentJob, SegmentStatus, Utterance};
