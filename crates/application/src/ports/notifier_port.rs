//! Notifier port - User-visible speech state

#[cfg(test)]
use mockall::automock;

/// Something the kiosk UI should show or hide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechNotice {
    /// Synthesis or playback failed; shown once until cleared
    AudioUnavailable,
    /// Audio is waiting for a tap before it can play
    TapToEnableAudio,
    /// A gesture unlocked audio output
    AudioEnabled,
    /// The audio-unavailable message was dismissed
    Cleared,
    /// Output started (`true`) or went idle (`false`)
    Speaking(bool),
}

/// Port for surfacing speech state to the UI
#[cfg_attr(test, automock)]
pub trait SpeechNotifier: Send + Sync {
    /// Deliver a notice; must not block
    fn notify(&self, notice: SpeechNotice);
}
