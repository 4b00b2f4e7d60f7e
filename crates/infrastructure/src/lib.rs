//! Infrastructure layer - Adapters, configuration and telemetry
//!
//! Wires the application ports to the local machine: an external player
//! process for audio, the log for user-visible notices, and the push-stream
//! client for incoming speech commands.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::{CommandAudioOutput, SpeechCommandListener, TracingNotifier};
pub use config::{AppConfig, AudioConfig, LogFormat, SpeechAppConfig};
pub use telemetry::{DEFAULT_FILTER, TelemetryError, init_tracing};
