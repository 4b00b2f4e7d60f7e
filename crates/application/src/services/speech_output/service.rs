//! Speech output service - Runs the pipeline on an event loop
//!
//! Commands, gestures and completions are funnelled through one channel so
//! every pipeline mutation happens on a single task. Synthesis and playback
//! run as spawned tasks that post their outcome back to the loop.

use std::{fmt, sync::Arc};

use ai_speech::{AudioData, SpeechError, SynthesisGateway};
use domain::SpeechCommand;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, trace, warn};

use super::{Effect, SpeechOutputConfig, SpeechPipeline, SynthesisTicket};
use crate::error::ApplicationError;
use crate::ports::{
    AudioOutput, GestureClassifier, InteractionEvent, PlaybackError, QualifyingGestures,
    SpeechNotifier,
};

#[derive(Debug)]
enum ServiceEvent {
    Command(SpeechCommand),
    Interaction(InteractionEvent),
    SynthesisFinished {
        ticket: SynthesisTicket,
        result: Result<AudioData, SpeechError>,
    },
    PlaybackFinished {
        play_id: u64,
        result: Result<(), PlaybackError>,
    },
    Shutdown,
}

/// Service that speaks incoming commands through the audio output
pub struct SpeechOutputService {
    synthesis: Arc<dyn SynthesisGateway>,
    output: Arc<dyn AudioOutput>,
    notifier: Arc<dyn SpeechNotifier>,
    gestures: Arc<dyn GestureClassifier>,
    config: SpeechOutputConfig,
}

impl fmt::Debug for SpeechOutputService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechOutputService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpeechOutputService {
    /// Create a service with default limits and gesture rules
    pub fn new(
        synthesis: Arc<dyn SynthesisGateway>,
        output: Arc<dyn AudioOutput>,
        notifier: Arc<dyn SpeechNotifier>,
    ) -> Self {
        Self {
            synthesis,
            output,
            notifier,
            gestures: Arc::new(QualifyingGestures::default()),
            config: SpeechOutputConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SpeechOutputConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_gesture_classifier(mut self, gestures: Arc<dyn GestureClassifier>) -> Self {
        self.gestures = gestures;
        self
    }

    /// Spawn the event loop
    ///
    /// Must be called from within a Tokio runtime. The loop ends on
    /// [`SpeechOutputHandle::shutdown`] or once every input is dropped.
    pub fn start(self) -> SpeechOutputHandle {
        let (events, receiver) = mpsc::unbounded_channel();
        let weak = events.downgrade();
        let task = tokio::spawn(EventLoop::new(self, weak).run(receiver));

        SpeechOutputHandle {
            input: SpeechInput { events },
            task,
        }
    }
}

/// Cloneable sender for commands and interactions
#[derive(Debug, Clone)]
pub struct SpeechInput {
    events: mpsc::UnboundedSender<ServiceEvent>,
}

impl SpeechInput {
    /// Queue a speech command
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::ServiceStopped` if the event loop has ended.
    pub fn submit(&self, command: SpeechCommand) -> Result<(), ApplicationError> {
        self.send(ServiceEvent::Command(command))
    }

    /// Report a user interaction
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::ServiceStopped` if the event loop has ended.
    pub fn interaction(&self, event: InteractionEvent) -> Result<(), ApplicationError> {
        self.send(ServiceEvent::Interaction(event))
    }

    fn send(&self, event: ServiceEvent) -> Result<(), ApplicationError> {
        self.events
            .send(event)
            .map_err(|_| ApplicationError::ServiceStopped)
    }
}

/// Handle to a running speech output service
#[derive(Debug)]
pub struct SpeechOutputHandle {
    input: SpeechInput,
    task: JoinHandle<()>,
}

impl SpeechOutputHandle {
    /// A sender that can be moved to other tasks
    pub fn input(&self) -> SpeechInput {
        self.input.clone()
    }

    /// Queue a speech command
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::ServiceStopped` if the event loop has ended.
    pub fn submit(&self, command: SpeechCommand) -> Result<(), ApplicationError> {
        self.input.submit(command)
    }

    /// Report a user interaction
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::ServiceStopped` if the event loop has ended.
    pub fn interaction(&self, event: InteractionEvent) -> Result<(), ApplicationError> {
        self.input.interaction(event)
    }

    /// Stop output and wait for the event loop to finish
    pub async fn shutdown(self) {
        let _ = self.input.send(ServiceEvent::Shutdown);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Speech output loop ended abnormally");
        }
    }
}

struct EventLoop {
    service: SpeechOutputService,
    pipeline: SpeechPipeline,
    events: mpsc::WeakUnboundedSender<ServiceEvent>,
    playing: Option<AbortHandle>,
}

impl EventLoop {
    fn new(service: SpeechOutputService, events: mpsc::WeakUnboundedSender<ServiceEvent>) -> Self {
        let pipeline = SpeechPipeline::new(&service.config);
        Self {
            service,
            pipeline,
            events,
            playing: None,
        }
    }

    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<ServiceEvent>) {
        info!(
            synthesis_concurrency = self.service.config.synthesis_concurrency,
            "Speech output started"
        );

        while let Some(event) = receiver.recv().await {
            let effects = match event {
                ServiceEvent::Command(command) => {
                    debug!(command = command.kind().wire_name(), "Speech command received");
                    self.pipeline.handle_command(command)
                },
                ServiceEvent::Interaction(interaction) => {
                    if !self.service.gestures.is_user_gesture(&interaction) {
                        trace!(?interaction, "Interaction does not unlock audio");
                        continue;
                    }
                    self.pipeline.user_gesture()
                },
                ServiceEvent::SynthesisFinished { ticket, result } => {
                    self.pipeline.synthesis_finished(ticket, result)
                },
                ServiceEvent::PlaybackFinished { play_id, result } => {
                    self.pipeline.playback_finished(play_id, result)
                },
                ServiceEvent::Shutdown => break,
            };

            for effect in effects {
                self.execute(effect).await;
            }
        }

        self.stop_audio();
        info!("Speech output stopped");
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Synthesize { ticket, text } => {
                let Some(events) = self.events.upgrade() else {
                    return;
                };
                let synthesis = Arc::clone(&self.service.synthesis);
                tokio::spawn(async move {
                    let result = synthesis.synthesize(&text).await;
                    let _ = events.send(ServiceEvent::SynthesisFinished { ticket, result });
                });
            },
            Effect::Play { play_id, audio } => {
                let Some(events) = self.events.upgrade() else {
                    return;
                };
                let output = Arc::clone(&self.service.output);
                let task = tokio::spawn(async move {
                    let result = output.play(audio).await;
                    let _ = events.send(ServiceEvent::PlaybackFinished { play_id, result });
                });
                self.playing = Some(task.abort_handle());
            },
            Effect::StopAudio => self.stop_audio(),
            Effect::WarmUp => {
                if let Err(e) = self.service.output.warm_up().await {
                    debug!(error = %e, "Audio warm-up failed; continuing");
                }
            },
            Effect::Notify(notice) => self.service.notifier.notify(notice),
        }
    }

    /// Cancel the play task, even if it has not started yet, and silence the device
    fn stop_audio(&mut self) {
        if let Some(playing) = self.playing.take() {
            playing.abort();
        }
        self.service.output.stop();
    }
}
