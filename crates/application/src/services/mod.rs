//! Application services - Use case implementations

mod speech_output;

pub use speech_output::{
    Effect, PendingItem, PlaybackTarget, SegmentJob, SegmentStatus, SpeechInput,
    SpeechOutputConfig, SpeechOutputHandle, SpeechOutputService, SpeechPipeline, SynthesisTicket,
    UnlockGate, Utterance, UtteranceHistory,
};
