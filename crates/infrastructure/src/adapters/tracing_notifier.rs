//! Notifier adapter - Surfaces speech notices as log events
//!
//! A headless kiosk has no overlay to draw, so notices go to the log where an
//! operator (or a log-shipping sidecar) can pick them up.

use application::ports::{SpeechNotice, SpeechNotifier};
use tracing::{debug, info, warn};

/// Notifier that logs every notice
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    /// Create a new notifier
    pub const fn new() -> Self {
        Self
    }
}

impl SpeechNotifier for TracingNotifier {
    fn notify(&self, notice: SpeechNotice) {
        match notice {
            SpeechNotice::AudioUnavailable => warn!(notice = ?notice, "Audio unavailable"),
            SpeechNotice::TapToEnableAudio => {
                info!(notice = ?notice, "Tap to enable audio (press Enter)");
            },
            SpeechNotice::AudioEnabled => info!(notice = ?notice, "Audio enabled"),
            SpeechNotice::Cleared => debug!(notice = ?notice, "Audio notice cleared"),
            SpeechNotice::Speaking(speaking) => debug!(speaking, "Speaking state changed"),
        }
    }
}
