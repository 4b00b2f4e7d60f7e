//! Stream listener adapter - Feeds push-stream frames into speech output

use application::SpeechInput;
use domain::{ServerMessage, SpeechCommand, UtteranceId};
use integration_stream::{StreamError, StreamListener};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Routes speech commands from the kiosk stream to the speech output service
#[derive(Debug, Clone)]
pub struct SpeechCommandListener {
    input: SpeechInput,
}

impl SpeechCommandListener {
    /// Create a listener that submits to `input`
    pub const fn new(input: SpeechInput) -> Self {
        Self { input }
    }
}

impl StreamListener for SpeechCommandListener {
    fn on_snapshot(&self, data: Value) {
        debug!(
            keys = data.as_object().map_or(0, serde_json::Map::len),
            "Received kiosk snapshot"
        );
    }

    fn on_message(&self, message: ServerMessage) {
        let command = match SpeechCommand::from_message(&message) {
            Ok(command) => command,
            Err(e) if e.is_unknown_command() => {
                trace!(kind = %message.kind, "Ignoring non-speech message");
                return;
            },
            Err(e) => {
                debug!(kind = %message.kind, error = %e, "Dropping malformed speech command");
                return;
            },
        };

        trace!(
            kind = command.kind().wire_name(),
            utterance_id = command.utterance_id().map(UtteranceId::as_str),
            "Submitting speech command"
        );
        if let Err(e) = self.input.submit(command) {
            warn!(error = %e, "Speech output is not accepting commands");
        }
    }

    fn on_error(&self, error: &StreamError) {
        warn!(error = %error, "Kiosk stream error");
    }
}
