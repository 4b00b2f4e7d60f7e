//! Speech output state machine
//!
//! Dispatches speech commands, schedules synthesis ahead of playback and
//! drives the single output slot. Performs no I/O: every call returns the
//! [`Effect`]s the caller must carry out, in order. Completions come back
//! through [`SpeechPipeline::synthesis_finished`] and
//! [`SpeechPipeline::playback_finished`] with the token they were issued
//! with; anything issued before the latest supersede is dropped silently.

use ai_speech::{AudioData, SpeechError};
use domain::{ChatRequestId, SpeechCommand, UtteranceId};
use tracing::{debug, trace, warn};

use super::{
    PendingItem, SegmentJob, SpeechOutputConfig, UnlockGate, Utterance, UtteranceHistory,
};
use crate::ports::{PlaybackError, SpeechNotice};

/// What an audio item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTarget {
    /// A segment of the active utterance, by index
    Segment(u32),
    /// The active legacy `speak` utterance
    Legacy,
}

/// Captured state a synthesis call was issued under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisTicket {
    pub generation: u64,
    pub target: PlaybackTarget,
}

/// Work the caller must carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Synthesize `text` and report back with the ticket
    Synthesize {
        ticket: SynthesisTicket,
        text: String,
    },
    /// Start playing `audio`; report its end with `play_id`
    Play { play_id: u64, audio: AudioData },
    /// Stop whatever is playing
    StopAudio,
    /// Prime the output after unlock, ignoring failure
    WarmUp,
    /// Surface a notice to the UI
    Notify(SpeechNotice),
}

#[derive(Debug, Clone)]
struct PlaybackSlot {
    play_id: u64,
    target: PlaybackTarget,
    audio: AudioData,
}

/// Dispatcher, utterance queue, playback driver and unlock gate in one state
///
/// One instance per output device; all mutation happens through `&mut self`.
#[derive(Debug)]
pub struct SpeechPipeline {
    concurrency: usize,
    generation: u64,
    next_play_id: u64,
    active: Option<Utterance>,
    history: UtteranceHistory,
    gate: UnlockGate,
    slot: Option<PlaybackSlot>,
    audio_error: bool,
    hint_shown: bool,
    speaking: bool,
    effects: Vec<Effect>,
}

impl SpeechPipeline {
    /// Create a pipeline with a locked gate and no active utterance
    pub fn new(config: &SpeechOutputConfig) -> Self {
        Self {
            concurrency: config.synthesis_concurrency.max(1),
            generation: 0,
            next_play_id: 0,
            active: None,
            history: UtteranceHistory::new(config.history_capacity),
            gate: UnlockGate::new(),
            slot: None,
            audio_error: false,
            hint_shown: false,
            speaking: false,
            effects: Vec::new(),
        }
    }

    /// Current generation; bumped by every supersede
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn active(&self) -> Option<&Utterance> {
        self.active.as_ref()
    }

    pub const fn history(&self) -> &UtteranceHistory {
        &self.history
    }

    pub const fn is_unlocked(&self) -> bool {
        self.gate.is_unlocked()
    }

    /// Item waiting for a user gesture
    pub fn pending(&self) -> Option<&PendingItem> {
        self.gate.pending()
    }

    /// Whether an item currently occupies the output
    pub const fn is_playing(&self) -> bool {
        self.slot.is_some()
    }

    /// Apply one inbound command
    pub fn handle_command(&mut self, command: SpeechCommand) -> Vec<Effect> {
        match command {
            SpeechCommand::Start {
                utterance_id,
                chat_request_id,
            } => self.start(utterance_id, chat_request_id),
            SpeechCommand::Segment {
                utterance_id,
                chat_request_id,
                index,
                text,
                is_last,
            } => self.segment(
                &utterance_id,
                &chat_request_id,
                SegmentJob::new(index, text, is_last),
            ),
            SpeechCommand::End {
                utterance_id,
                chat_request_id,
            } => self.end(&utterance_id, &chat_request_id),
            SpeechCommand::Speak { say_id, text } => self.speak(say_id, text),
            SpeechCommand::StopOutput => self.stop_output(),
        }
        self.take_effects()
    }

    /// A synthesis call issued with `ticket` resolved
    pub fn synthesis_finished(
        &mut self,
        ticket: SynthesisTicket,
        result: Result<AudioData, SpeechError>,
    ) -> Vec<Effect> {
        if ticket.generation != self.generation {
            trace!(
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale synthesis result"
            );
            return self.take_effects();
        }

        let audio = match result {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => {
                warn!(item = ?ticket.target, "Synthesis returned no audio");
                None
            },
            Err(e) => {
                warn!(item = ?ticket.target, error = %e, "Synthesis failed");
                None
            },
        };
        if audio.is_none() {
            self.report_audio_error();
        }

        match (ticket.target, audio) {
            (PlaybackTarget::Segment(index), audio) => {
                if let Some(active) = self.active.as_mut() {
                    active.resolve(index, audio);
                }
                self.schedule();
                self.advance();
            },
            (PlaybackTarget::Legacy, Some(audio)) => self.present(PlaybackTarget::Legacy, audio),
            (PlaybackTarget::Legacy, None) => self.finish_legacy(),
        }
        self.take_effects()
    }

    /// The item started with `play_id` ended
    pub fn playback_finished(
        &mut self,
        play_id: u64,
        result: Result<(), PlaybackError>,
    ) -> Vec<Effect> {
        let Some(slot) = self.slot.take_if(|slot| slot.play_id == play_id) else {
            trace!(play_id, "Ignoring playback event for a superseded item");
            return self.take_effects();
        };

        match result {
            Ok(()) | Err(PlaybackError::Interrupted) => self.complete(slot.target),
            Err(PlaybackError::Blocked) => {
                debug!(play_id, "Playback blocked; waiting for a user gesture");
                self.gate.relock();
                self.gate.hold(PendingItem::Audio {
                    generation: self.generation,
                    target: slot.target,
                    audio: slot.audio,
                });
                self.show_hint();
            },
            Err(e) => {
                warn!(play_id, error = %e, "Playback failed");
                self.report_audio_error();
                self.complete(slot.target);
            },
        }
        self.take_effects()
    }

    /// A qualifying user gesture happened
    ///
    /// The first one while locked unlocks output, requests a warm-up and
    /// flushes the pending item.
    pub fn user_gesture(&mut self) -> Vec<Effect> {
        if !self.gate.unlock() {
            return self.take_effects();
        }
        debug!("Audio output unlocked");
        self.effects.push(Effect::WarmUp);
        self.hint_shown = false;
        self.effects
            .push(Effect::Notify(SpeechNotice::AudioEnabled));

        match self.gate.take_pending() {
            Some(item) if item.generation() != self.generation => {
                trace!(generation = item.generation(), "Dropping superseded pending item");
            },
            Some(PendingItem::Text { say_id, text, .. }) => {
                debug!(say_id = %say_id, "Flushing held speak");
                self.request_legacy_synthesis(text);
            },
            Some(PendingItem::Audio { target, audio, .. }) => self.start_playback(target, audio),
            None => {},
        }
        self.advance();
        self.take_effects()
    }

    fn start(&mut self, utterance_id: UtteranceId, chat_request_id: ChatRequestId) {
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.is_open_with_id(&utterance_id))
        {
            debug!(utterance_id = %utterance_id, "Duplicate speech.start ignored");
            return;
        }

        self.supersede();
        self.clear_audio_error();
        debug!(
            utterance_id = %utterance_id,
            chat_request_id = %chat_request_id,
            generation = self.generation,
            "Utterance started"
        );
        self.active = Some(Utterance::segmented(utterance_id, chat_request_id));
    }

    fn segment(
        &mut self,
        utterance_id: &UtteranceId,
        chat_request_id: &ChatRequestId,
        job: SegmentJob,
    ) {
        let index = job.index;
        let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.matches(utterance_id, chat_request_id))
        else {
            debug!(
                utterance_id = %utterance_id,
                segment_index = index,
                "Segment for inactive utterance ignored"
            );
            return;
        };

        if !active.insert(job) {
            debug!(
                utterance_id = %utterance_id,
                segment_index = index,
                next_play_index = active.next_play_index(),
                "Stale or duplicate segment ignored"
            );
            return;
        }
        trace!(utterance_id = %utterance_id, segment_index = index, "Segment queued");

        self.schedule();
        self.advance();
    }

    fn end(&mut self, utterance_id: &UtteranceId, chat_request_id: &ChatRequestId) {
        match self.active.as_mut() {
            Some(active) if active.matches(utterance_id, chat_request_id) => {
                if !active.is_closed() {
                    active.close();
                    self.history.record(utterance_id.clone());
                    debug!(utterance_id = %utterance_id, "Utterance closed");
                }
            },
            _ => debug!(utterance_id = %utterance_id, "Stale speech.end ignored"),
        }
    }

    fn speak(&mut self, say_id: UtteranceId, text: String) {
        if text.trim().is_empty() {
            debug!(say_id = %say_id, "Blank speak ignored");
            return;
        }
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.is_open_with_id(&say_id))
        {
            debug!(say_id = %say_id, "speak duplicates the open utterance; ignored");
            return;
        }
        if self.history.contains(&say_id) {
            debug!(say_id = %say_id, "speak repeats a finished utterance; ignored");
            return;
        }

        self.supersede();
        self.clear_audio_error();
        self.active = Some(Utterance::legacy(say_id.clone()));

        if self.gate.is_unlocked() {
            debug!(say_id = %say_id, generation = self.generation, "Legacy utterance started");
            self.request_legacy_synthesis(text);
        } else {
            debug!(say_id = %say_id, "Audio locked; holding speak until a gesture");
            self.gate.hold(PendingItem::Text {
                generation: self.generation,
                say_id,
                text,
            });
            self.show_hint();
        }
    }

    fn stop_output(&mut self) {
        debug!(generation = self.generation, "Stopping speech output");
        self.supersede();
        self.clear_audio_error();
    }

    /// Invalidate everything issued so far and silence the output
    fn supersede(&mut self) {
        self.generation += 1;
        if let Some(previous) = self.active.take() {
            if !previous.is_closed() {
                self.history.record(previous.id().clone());
            }
        }
        if self.slot.take().is_some() {
            self.effects.push(Effect::StopAudio);
        }
        self.gate.clear();
    }

    fn schedule(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        while let Some((index, text)) = active.admit_next(self.concurrency) {
            trace!(
                segment_index = index,
                in_flight = active.in_flight(),
                "Synthesis admitted"
            );
            self.effects.push(Effect::Synthesize {
                ticket: SynthesisTicket {
                    generation: self.generation,
                    target: PlaybackTarget::Segment(index),
                },
                text,
            });
        }
    }

    /// Hand the next ready segment to the gate if the output is free
    fn advance(&mut self) {
        if self.slot.is_some() || self.gate.holds_audio() {
            return;
        }
        let Some(active) = self.active.as_mut().filter(|active| !active.is_legacy()) else {
            return;
        };

        let skipped = active.skip_unplayable();
        if skipped > 0 {
            trace!(
                skipped,
                next_play_index = active.next_play_index(),
                "Skipped unplayable segments"
            );
        }
        let index = active.next_play_index();
        if let Some(audio) = active.take_ready() {
            self.present(PlaybackTarget::Segment(index), audio);
        }
    }

    fn present(&mut self, target: PlaybackTarget, audio: AudioData) {
        if self.gate.is_unlocked() {
            self.start_playback(target, audio);
        } else {
            debug!(item = ?target, "Audio locked; holding item until a gesture");
            self.gate.hold(PendingItem::Audio {
                generation: self.generation,
                target,
                audio,
            });
            self.show_hint();
        }
    }

    fn start_playback(&mut self, target: PlaybackTarget, audio: AudioData) {
        self.next_play_id += 1;
        let play_id = self.next_play_id;
        debug!(play_id, item = ?target, size_bytes = audio.size_bytes(), "Starting playback");
        self.slot = Some(PlaybackSlot {
            play_id,
            target,
            audio: audio.clone(),
        });
        self.effects.push(Effect::Play { play_id, audio });
    }

    fn complete(&mut self, target: PlaybackTarget) {
        match target {
            PlaybackTarget::Segment(index) => {
                let finished = self.active.as_mut().and_then(|active| active.finish(index));
                if finished.is_some_and(|job| job.is_last) {
                    debug!(segment_index = index, "Final segment played");
                }
                self.advance();
            },
            PlaybackTarget::Legacy => self.finish_legacy(),
        }
    }

    fn finish_legacy(&mut self) {
        if let Some(active) = self
            .active
            .as_mut()
            .filter(|active| active.is_legacy() && !active.is_closed())
        {
            active.close();
            self.history.record(active.id().clone());
            debug!(say_id = %active.id(), "Legacy utterance finished");
        }
    }

    fn request_legacy_synthesis(&mut self, text: String) {
        self.effects.push(Effect::Synthesize {
            ticket: SynthesisTicket {
                generation: self.generation,
                target: PlaybackTarget::Legacy,
            },
            text,
        });
    }

    fn report_audio_error(&mut self) {
        if !self.audio_error {
            self.audio_error = true;
            self.effects
                .push(Effect::Notify(SpeechNotice::AudioUnavailable));
        }
    }

    fn clear_audio_error(&mut self) {
        if self.audio_error {
            self.audio_error = false;
            self.effects.push(Effect::Notify(SpeechNotice::Cleared));
        }
    }

    fn show_hint(&mut self) {
        if !self.hint_shown {
            self.hint_shown = true;
            self.effects
                .push(Effect::Notify(SpeechNotice::TapToEnableAudio));
        }
    }

    fn take_effects(&mut self) -> Vec<Effect> {
        let speaking = self.slot.is_some();
        if speaking != self.speaking {
            self.speaking = speaking;
            self.effects
                .push(Effect::Notify(SpeechNotice::Speaking(speaking)));
        }
        std::mem::take(&mut self.effects)
    }
}
