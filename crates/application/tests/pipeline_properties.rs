//! Property tests for speech output ordering and synthesis limits

use std::collections::HashMap;

use ai_speech::{AudioData, AudioFormat, SpeechError};
use application::{Effect, SpeechOutputConfig, SpeechPipeline, SynthesisTicket, Utterance};
use domain::SpeechCommand;
use proptest::prelude::*;
use proptest::sample::Index;

#[derive(Debug, Default)]
struct Outcome {
    played: Vec<u32>,
    synthesis_calls: HashMap<u32, usize>,
    max_in_flight: usize,
}

struct Simulation {
    pipeline: SpeechPipeline,
    in_flight: Vec<(SynthesisTicket, u32)>,
    playing: Option<(u64, u32)>,
    failures: Vec<bool>,
    outcome: Outcome,
}

fn index_of(text: &str) -> u32 {
    text.trim_start_matches('s').parse().expect("segment text")
}

impl Simulation {
    fn new(cap: usize, failures: Vec<bool>) -> Self {
        let mut pipeline = SpeechPipeline::new(&SpeechOutputConfig {
            synthesis_concurrency: cap,
            ..SpeechOutputConfig::default()
        });
        pipeline.user_gesture();
        let mut sim = Self {
            pipeline,
            in_flight: Vec::new(),
            playing: None,
            failures,
            outcome: Outcome::default(),
        };
        let effects = sim.pipeline.handle_command(SpeechCommand::Start {
            utterance_id: "u1".into(),
            chat_request_id: "c1".into(),
        });
        sim.apply(effects);
        sim
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Synthesize { ticket, text } => {
                    let index = index_of(&text);
                    *self.outcome.synthesis_calls.entry(index).or_default() += 1;
                    self.in_flight.push((ticket, index));
                },
                Effect::Play { play_id, audio } => {
                    assert!(self.playing.is_none(), "two items live at once");
                    let text = String::from_utf8_lossy(audio.data()).into_owned();
                    self.playing = Some((play_id, index_of(&text)));
                },
                Effect::StopAudio => panic!("nothing should stop output"),
                Effect::WarmUp | Effect::Notify(_) => {},
            }
        }
        let in_flight = self
            .pipeline
            .active()
            .map_or(0, Utterance::in_flight);
        assert_eq!(in_flight, self.in_flight.len());
        self.outcome.max_in_flight = self.outcome.max_in_flight.max(in_flight);
    }

    fn deliver(&mut self, index: u32, last: u32) {
        let effects = self.pipeline.handle_command(SpeechCommand::Segment {
            utterance_id: "u1".into(),
            chat_request_id: "c1".into(),
            index,
            text: format!("s{index}"),
            is_last: index == last,
        });
        self.apply(effects);
    }

    fn resolve(&mut self, position: usize) {
        let (ticket, index) = self.in_flight.remove(position);
        let result = if self.failures[index as usize] {
            Err(SpeechError::ConnectionFailed("refused".into()))
        } else {
            Ok(AudioData::new(format!("s{index}").into_bytes(), AudioFormat::Wav))
        };
        let effects = self.pipeline.synthesis_finished(ticket, result);
        self.apply(effects);
    }

    fn finish_playback(&mut self) {
        if let Some((play_id, index)) = self.playing.take() {
            self.outcome.played.push(index);
            let effects = self.pipeline.playback_finished(play_id, Ok(()));
            self.apply(effects);
        }
    }

    /// Run every arrival, completion and playback end in an order chosen by `picks`
    fn run(mut self, arrivals: Vec<u32>, picks: &[Index]) -> Outcome {
        let last = arrivals.iter().copied().max().unwrap_or(0);
        let mut arrivals = arrivals.into_iter().peekable();
        let mut step = 0;
        loop {
            let can_arrive = usize::from(arrivals.peek().is_some());
            let can_finish = usize::from(self.playing.is_some());
            let options = can_arrive + self.in_flight.len() + can_finish;
            if options == 0 {
                break;
            }

            let choice = picks[step % picks.len()].index(options);
            if choice < can_arrive {
                if let Some(index) = arrivals.next() {
                    self.deliver(index, last);
                }
            } else if choice < can_arrive + self.in_flight.len() {
                self.resolve(choice - can_arrive);
            } else {
                self.finish_playback();
            }
            step += 1;
        }
        self.outcome
    }
}

fn scenario() -> impl Strategy<Value = (Vec<u32>, Vec<Index>, Vec<bool>, usize)> {
    (1_u32..10).prop_flat_map(|n| {
        let len = n as usize;
        (
            Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
            prop::collection::vec(any::<Index>(), len * 4),
            prop::collection::vec(prop::bool::weighted(0.2), len),
            1_usize..5,
        )
    })
}

proptest! {
    #[test]
    fn playback_order_is_ascending_for_any_interleaving(
        (arrivals, picks, failures, cap) in scenario()
    ) {
        let expected: Vec<u32> = (0..arrivals.len() as u32)
            .filter(|i| !failures[*i as usize])
            .collect();

        let outcome = Simulation::new(cap, failures).run(arrivals, &picks);

        prop_assert_eq!(outcome.played, expected);
    }

    #[test]
    fn synthesis_never_exceeds_concurrency_cap(
        (arrivals, picks, failures, cap) in scenario()
    ) {
        let outcome = Simulation::new(cap, failures).run(arrivals, &picks);

        prop_assert!(outcome.max_in_flight <= cap);
    }

    #[test]
    fn repeated_segments_are_synthesized_once(
        (arrivals, picks, failures, cap) in scenario(),
        repeats in prop::collection::vec(any::<Index>(), 1..10),
    ) {
        let n = arrivals.len();
        let mut with_repeats = arrivals.clone();
        for repeat in &repeats {
            let position = repeat.index(with_repeats.len() + 1);
            with_repeats.insert(position, arrivals[repeat.index(n)]);
        }

        let outcome = Simulation::new(cap, failures).run(with_repeats, &picks);

        prop_assert!(outcome.synthesis_calls.values().all(|calls| *calls == 1));
        prop_assert!(outcome.played.windows(2).all(|w| w[0] < w[1]));
    }
}
