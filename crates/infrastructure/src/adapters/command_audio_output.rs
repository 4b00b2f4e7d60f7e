//! Audio output adapter - Plays each item through an external player process
//!
//! The audio bytes are written to the player's stdin, so any player that reads
//! a container from `-` works (`ffplay`, `mpv`, `aplay` for WAV).

use std::io::ErrorKind;
use std::process::Stdio;

use ai_speech::AudioData;
use application::ports::{AudioOutput, PlaybackError};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Notify;
use tracing::{debug, instrument};

use crate::config::AudioConfig;

/// Audio output backed by a player command
#[derive(Debug)]
pub struct CommandAudioOutput {
    command: String,
    args: Vec<String>,
    stop_signal: Notify,
}

impl CommandAudioOutput {
    /// Create an output that runs `command` with `args` for every item
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            stop_signal: Notify::new(),
        }
    }

    /// Create an output from the audio configuration section
    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(config.player_command.clone(), config.player_args.clone())
    }

    async fn run_player(&self, audio: &AudioData) -> Result<(), PlaybackError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Device(format!("Failed to start {}: {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(audio.data()).await {
                Ok(()) => {},
                // The player may exit before consuming everything
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!(player = %self.command, "Player closed stdin early");
                },
                Err(e) => {
                    return Err(PlaybackError::Device(format!(
                        "Failed to write to {}: {e}",
                        self.command
                    )));
                },
            }
        }

        let status = child.wait().await.map_err(|e| {
            PlaybackError::Device(format!("Failed to wait for {}: {e}", self.command))
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::Decode(format!(
                "{} exited with {status}",
                self.command
            )))
        }
    }
}

#[async_trait]
impl AudioOutput for CommandAudioOutput {
    #[instrument(skip(self, audio), fields(bytes = audio.size_bytes(), format = ?audio.format()))]
    async fn play(&self, audio: AudioData) -> Result<(), PlaybackError> {
        if audio.is_empty() {
            return Err(PlaybackError::Decode("Empty audio".to_string()));
        }

        // Register before spawning so a stop issued during startup is not lost
        let stopped = self.stop_signal.notified();

        tokio::select! {
            biased;
            () = stopped => {
                debug!("Playback stopped");
                Err(PlaybackError::Interrupted)
            },
            result = self.run_player(&audio) => result,
        }
    }

    fn stop(&self) {
        self.stop_signal.notify_waiters();
    }

    async fn warm_up(&self) -> Result<(), PlaybackError> {
        // A spawned player has no device to prime
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use ai_speech::AudioFormat;

    use super::*;

    fn sh(script: &str) -> CommandAudioOutput {
        CommandAudioOutput::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    fn audio(len: usize) -> AudioData {
        AudioData::new(vec![0u8; len], AudioFormat::Wav)
    }

    #[tokio::test]
    async fn natural_end_is_ok() {
        let output = sh("cat > /dev/null");
        assert_eq!(output.play(audio(1024)).await, Ok(()));
    }

    #[tokio::test]
    async fn player_exiting_early_is_not_an_error() {
        let output = CommandAudioOutput::new("true", Vec::new());
        assert_eq!(output.play(audio(256 * 1024)).await, Ok(()));
    }

    #[tokio::test]
    async fn failing_player_reports_decode_error() {
        let output = sh("cat > /dev/null; exit 3");
        let result = output.play(audio(16)).await;
        assert!(matches!(result, Err(PlaybackError::Decode(_))));
    }

    #[tokio::test]
    async fn missing_player_reports_device_error() {
        let output = CommandAudioOutput::new("/nonexistent/player", Vec::new());
        let result = output.play(audio(16)).await;
        assert!(matches!(result, Err(PlaybackError::Device(_))));
    }

    #[tokio::test]
    async fn empty_audio_is_rejected() {
        let output = sh("cat > /dev/null");
        let result = output.play(audio(0)).await;
        assert!(matches!(result, Err(PlaybackError::Decode(_))));
    }

    #[tokio::test]
    async fn stop_interrupts_playback() {
        let output = Arc::new(sh("cat > /dev/null; sleep 30"));
        let player = Arc::clone(&output);
        let mut task = tokio::spawn(async move { player.play(audio(16)).await });

        let result = loop {
            output.stop();
            if let Ok(joined) = tokio::time::timeout(Duration::from_millis(50), &mut task).await {
                break joined.unwrap();
            }
        };

        assert_eq!(result, Err(PlaybackError::Interrupted));
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let output = sh("cat > /dev/null");
        output.stop();
        assert_eq!(output.play(audio(8)).await, Ok(()));
        assert_eq!(output.warm_up().await, Ok(()));
    }

    #[test]
    fn built_from_config() {
        let output = CommandAudioOutput::from_config(&AudioConfig::default());
        assert_eq!(output.command, "ffplay");
        assert_eq!(output.args.last().map(String::as_str), Some("-"));
    }
}
