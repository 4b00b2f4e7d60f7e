//! Audio output port - Interface for the single playback device

use ai_speech::AudioData;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Why a play attempt did not reach its natural end
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Output refused until the user interacts with the device
    #[error("Playback blocked until user interaction")]
    Blocked,

    /// Audio could not be decoded
    #[error("Audio decode failed: {0}")]
    Decode(String),

    /// Output device failed
    #[error("Audio device error: {0}")]
    Device(String),

    /// Playback was cut short by a stop request
    #[error("Playback interrupted")]
    Interrupted,
}

impl PlaybackError {
    /// Whether a later user gesture can make this item playable
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Port for the audio output slot
///
/// Only one item plays at a time. Callers never invoke `play` while a previous
/// call is still pending unless they called `stop` in between.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play `audio` and resolve when it ends
    ///
    /// Resolves with `Ok(())` on natural end and with
    /// `PlaybackError::Interrupted` when cut short by [`stop`](Self::stop).
    async fn play(&self, audio: AudioData) -> Result<(), PlaybackError>;

    /// Stop whatever is playing; no-op when idle
    fn stop(&self);

    /// Prime the output device after the first user gesture
    ///
    /// Best effort: callers ignore the result.
    async fn warm_up(&self) -> Result<(), PlaybackError>;
}
