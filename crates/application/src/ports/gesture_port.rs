//! Gesture port - Decides which interactions unlock audio output

#[cfg(test)]
use mockall::automock;

/// Kind of user interaction reported by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    PointerDown,
    Click,
    TouchStart,
    KeyDown,
    PointerMove,
    Scroll,
    Focus,
}

/// One interaction event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionEvent {
    /// What happened
    pub kind: InteractionKind,
    /// Whether the event came from a real input device rather than a script
    pub trusted: bool,
}

impl InteractionEvent {
    /// A trusted event from a real input device
    pub const fn trusted(kind: InteractionKind) -> Self {
        Self {
            kind,
            trusted: true,
        }
    }

    /// A synthetic event
    pub const fn synthetic(kind: InteractionKind) -> Self {
        Self {
            kind,
            trusted: false,
        }
    }
}

/// Port for classifying interactions as audio-unlocking gestures
#[cfg_attr(test, automock)]
pub trait GestureClassifier: Send + Sync {
    /// Whether `event` counts as a user gesture
    fn is_user_gesture(&self, event: &InteractionEvent) -> bool;
}

/// Default classifier: trusted pointer-down, click, touch-start or key-down
#[derive(Debug, Clone)]
pub struct QualifyingGestures {
    kinds: Vec<InteractionKind>,
}

impl Default for QualifyingGestures {
    fn default() -> Self {
        Self {
            kinds: vec![
                InteractionKind::PointerDown,
                InteractionKind::Click,
                InteractionKind::TouchStart,
                InteractionKind::KeyDown,
            ],
        }
    }
}

impl QualifyingGestures {
    /// Accept only the given kinds
    pub fn new(kinds: impl IntoIterator<Item = InteractionKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }
}

impl GestureClassifier for QualifyingGestures {
    fn is_user_gesture(&self, event: &InteractionEvent) -> bool {
        event.trusted && self.kinds.contains(&event.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_trusted_activation_events() {
        let gestures = QualifyingGestures::default();
        for kind in [
            InteractionKind::PointerDown,
            InteractionKind::Click,
            InteractionKind::TouchStart,
            InteractionKind::KeyDown,
        ] {
            assert!(gestures.is_user_gesture(&InteractionEvent::trusted(kind)));
        }
    }

    #[test]
    fn default_rejects_passive_and_synthetic_events() {
        let gestures = QualifyingGestures::default();
        assert!(!gestures.is_user_gesture(&InteractionEvent::trusted(InteractionKind::Scroll)));
        assert!(!gestures.is_user_gesture(&InteractionEvent::trusted(
            InteractionKind::PointerMove
        )));
        assert!(!gestures.is_user_gesture(&InteractionEvent::synthetic(InteractionKind::Click)));
    }

    #[test]
    fn custom_kinds() {
        let gestures = QualifyingGestures::new([InteractionKind::Focus]);
        assert!(gestures.is_user_gesture(&InteractionEvent::trusted(InteractionKind::Focus)));
        assert!(!gestures.is_user_gesture(&InteractionEvent::trusted(InteractionKind::Click)));
    }
}
