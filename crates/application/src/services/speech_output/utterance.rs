//! The active utterance and its segment jobs

use std::collections::BTreeMap;

use ai_speech::AudioData;
use domain::{ChatRequestId, UtteranceId};

/// Lifecycle of one segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentStatus {
    /// Waiting for a synthesis slot
    Pending,
    /// Synthesis request in flight
    Synthesizing,
    /// Audio available, waiting for its turn
    Ready(AudioData),
    /// Handed to the output; stays here until playback ends
    Playing,
    /// Synthesis failed; skipped when reached
    Failed,
    /// Nothing to say; skipped when reached
    Skipped,
}

impl SegmentStatus {
    /// Whether playback passes over this segment without output
    pub const fn is_skippable(&self) -> bool {
        matches!(self, Self::Failed | Self::Skipped)
    }
}

/// One ordered chunk of a segmented utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentJob {
    pub index: u32,
    pub text: String,
    pub is_last: bool,
    pub status: SegmentStatus,
}

impl SegmentJob {
    /// A job for `text`; blank text is skipped without synthesis
    pub fn new(index: u32, text: impl Into<String>, is_last: bool) -> Self {
        let text = text.into();
        let status = if text.trim().is_empty() {
            SegmentStatus::Skipped
        } else {
            SegmentStatus::Pending
        };
        Self {
            index,
            text,
            is_last,
            status,
        }
    }
}

/// The single active utterance
///
/// Segmented utterances carry the chat request they answer; a legacy `speak`
/// utterance has none and never holds segment jobs.
#[derive(Debug, Clone)]
pub struct Utterance {
    id: UtteranceId,
    chat_request_id: Option<ChatRequestId>,
    segments: BTreeMap<u32, SegmentJob>,
    next_play_index: u32,
    in_flight: usize,
    closed: bool,
}

impl Utterance {
    /// A segmented utterance started by `speech.start`
    pub fn segmented(id: UtteranceId, chat_request_id: ChatRequestId) -> Self {
        Self::with_request(id, Some(chat_request_id))
    }

    /// A single-block utterance started by legacy `speak`
    pub fn legacy(id: UtteranceId) -> Self {
        Self::with_request(id, None)
    }

    fn with_request(id: UtteranceId, chat_request_id: Option<ChatRequestId>) -> Self {
        Self {
            id,
            chat_request_id,
            segments: BTreeMap::new(),
            next_play_index: 0,
            in_flight: 0,
            closed: false,
        }
    }

    pub fn id(&self) -> &UtteranceId {
        &self.id
    }

    pub const fn is_legacy(&self) -> bool {
        self.chat_request_id.is_none()
    }

    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub const fn next_play_index(&self) -> u32 {
        self.next_play_index
    }

    /// Synthesis calls currently in flight for this utterance
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn segment(&self, index: u32) -> Option<&SegmentJob> {
        self.segments.get(&index)
    }

    /// Whether a command's ids address this utterance
    pub fn matches(&self, utterance_id: &UtteranceId, chat_request_id: &ChatRequestId) -> bool {
        self.id == *utterance_id && self.chat_request_id.as_ref() == Some(chat_request_id)
    }

    /// Whether the id names this utterance while it is still open
    pub fn is_open_with_id(&self, id: &UtteranceId) -> bool {
        !self.closed && self.id == *id
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Add a job unless its index is stale or taken
    ///
    /// Returns `false` when the job was ignored.
    pub fn insert(&mut self, job: SegmentJob) -> bool {
        if job.index < self.next_play_index || self.segments.contains_key(&job.index) {
            return false;
        }
        self.segments.insert(job.index, job);
        true
    }

    /// Admit the lowest-index pending job if fewer than `cap` calls are in flight
    ///
    /// Returns the admitted job's index and text.
    pub fn admit_next(&mut self, cap: usize) -> Option<(u32, String)> {
        if self.in_flight >= cap {
            return None;
        }
        let job = self
            .segments
            .values_mut()
            .find(|job| job.status == SegmentStatus::Pending)?;
        job.status = SegmentStatus::Synthesizing;
        self.in_flight += 1;
        Some((job.index, job.text.clone()))
    }

    /// Record the outcome of a synthesis call for `index`
    ///
    /// Frees the in-flight slot. `None` marks the job failed.
    pub fn resolve(&mut self, index: u32, audio: Option<AudioData>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let Some(job) = self.segments.get_mut(&index) {
            if job.status == SegmentStatus::Synthesizing {
                job.status = audio.map_or(SegmentStatus::Failed, SegmentStatus::Ready);
            }
        }
    }

    /// Take the ready audio at the play position, marking it playing
    pub fn take_ready(&mut self) -> Option<AudioData> {
        let job = self.segments.get_mut(&self.next_play_index)?;
        if !matches!(job.status, SegmentStatus::Ready(_)) {
            return None;
        }
        match std::mem::replace(&mut job.status, SegmentStatus::Playing) {
            SegmentStatus::Ready(audio) => Some(audio),
            _ => None,
        }
    }

    /// Drop skippable jobs at the play position, advancing past them
    ///
    /// Returns how many were skipped.
    pub fn skip_unplayable(&mut self) -> u32 {
        let mut skipped = 0;
        while self
            .segments
            .get(&self.next_play_index)
            .is_some_and(|job| job.status.is_skippable())
        {
            self.segments.remove(&self.next_play_index);
            self.next_play_index += 1;
            skipped += 1;
        }
        skipped
    }

    /// Finish the job at `index` after playback and move to the next position
    ///
    /// Returns the finished job, if it was the one at the play position.
    pub fn finish(&mut self, index: u32) -> Option<SegmentJob> {
        if index != self.next_play_index {
            return None;
        }
        let job = self.segments.remove(&index)?;
        self.next_play_index += 1;
        Some(job)
    }
}
