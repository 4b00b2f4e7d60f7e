//! Gate between the playback driver and an output that needs a user gesture

use ai_speech::AudioData;
use domain::UtteranceId;

use super::PlaybackTarget;

/// The one item waiting for the gate to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingItem {
    /// Legacy text not yet synthesized
    Text {
        generation: u64,
        say_id: UtteranceId,
        text: String,
    },
    /// Synthesized audio whose play attempt is deferred
    Audio {
        generation: u64,
        target: PlaybackTarget,
        audio: AudioData,
    },
}

impl PendingItem {
    pub const fn generation(&self) -> u64 {
        match self {
            Self::Text { generation, .. } | Self::Audio { generation, .. } => *generation,
        }
    }
}

/// Locked/unlocked audio output plus at most one pending item
///
/// Holding a new item replaces the previous one, so only the freshest request
/// plays after unlock.
#[derive(Debug, Clone, Default)]
pub struct UnlockGate {
    unlocked: bool,
    pending: Option<PendingItem>,
}

impl UnlockGate {
    /// A locked gate
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Open the gate; returns `true` if it was locked
    pub fn unlock(&mut self) -> bool {
        !std::mem::replace(&mut self.unlocked, true)
    }

    /// Close the gate after the output refused to play
    pub fn relock(&mut self) {
        self.unlocked = false;
    }

    /// Remember `item`, returning the one it displaced
    pub fn hold(&mut self, item: PendingItem) -> Option<PendingItem> {
        self.pending.replace(item)
    }

    pub fn take_pending(&mut self) -> Option<PendingItem> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&PendingItem> {
        self.pending.as_ref()
    }

    /// Whether deferred audio occupies the output's turn
    pub fn holds_audio(&self) -> bool {
        matches!(self.pending, Some(PendingItem::Audio { .. }))
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
