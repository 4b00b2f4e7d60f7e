//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod command_audio_output;
mod speech_stream_listener;
mod tracing_notifier;

pub use command_audio_output::CommandAudioOutput;
pub use speech_stream_listener::SpeechCommandListener;
pub use tracing_notifier::TracingNotifier;
