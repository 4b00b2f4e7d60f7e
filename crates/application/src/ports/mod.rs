//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod audio_output_port;
mod gesture_port;
mod notifier_port;

#[cfg(test)]
pub use audio_output_port::MockAudioOutput;
pub use audio_output_port::{AudioOutput, PlaybackError};
#[cfg(test)]
pub use gesture_port::MockGestureClassifier;
pub use gesture_port::{GestureClassifier, InteractionEvent, InteractionKind, QualifyingGestures};
#[cfg(test)]
pub use notifier_port::MockSpeechNotifier;
pub use notifier_port::{SpeechNotice, SpeechNotifier};
