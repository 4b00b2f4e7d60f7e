//! Bounded history of finished utterance ids

use std::collections::{HashSet, VecDeque};

use domain::UtteranceId;

/// Fixed-capacity FIFO set of recently closed or superseded utterance ids
///
/// Used to recognise a legacy `speak` that repeats an utterance which already
/// played through the segmented path.
#[derive(Debug, Clone)]
pub struct UtteranceHistory {
    capacity: usize,
    order: VecDeque<UtteranceId>,
    members: HashSet<UtteranceId>,
}

impl UtteranceHistory {
    /// Create an empty history holding at most `capacity` ids (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    /// Record `id`, evicting the oldest entry when full
    ///
    /// Recording an id that is already present does not refresh its position.
    pub fn record(&mut self, id: UtteranceId) {
        if self.members.contains(&id) {
            return;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.members.insert(id.clone());
        self.order.push_back(id);
    }

    /// Whether `id` was recorded and not yet evicted
    pub fn contains(&self, id: &UtteranceId) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
