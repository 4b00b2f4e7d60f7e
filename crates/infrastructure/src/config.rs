//! Application configuration
//!
//! Layered as built-in defaults, then an optional `config.toml`, then
//! `KIOSK_*` environment variables with `__` between nested keys
//! (e.g. `KIOSK_STREAM__RECONNECT__ENABLED=false`).

use std::fmt;
use std::path::Path;

use ai_speech::SynthesisConfig;
use application::SpeechOutputConfig;
use integration_stream::StreamConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "KIOSK";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid log format: {s}. Use 'text' or 'json'")),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Push-stream connection
    #[serde(default)]
    pub stream: StreamConfig,

    /// Speech synthesis and output pipeline
    #[serde(default)]
    pub speech: SpeechAppConfig,

    /// Local audio player
    #[serde(default)]
    pub audio: AudioConfig,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Speech synthesis backend and pipeline limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechAppConfig {
    /// Synthesis backend base URL
    #[serde(default = "default_speech_base_url")]
    pub base_url: String,

    /// Path of the synthesis endpoint
    #[serde(default = "default_synthesis_path")]
    pub synthesis_path: String,

    /// Optional bearer token for the synthesis backend; never serialized
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Synthesis request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum synthesis calls in flight per utterance
    #[serde(default = "default_synthesis_concurrency")]
    pub synthesis_concurrency: usize,

    /// Finished utterance ids remembered for de-duplication
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_speech_base_url() -> String {
    SynthesisConfig::default().base_url
}

fn default_synthesis_path() -> String {
    SynthesisConfig::default().synthesis_path
}

fn default_timeout_ms() -> u64 {
    SynthesisConfig::default().timeout_ms
}

fn default_synthesis_concurrency() -> usize {
    SpeechOutputConfig::default().synthesis_concurrency
}

fn default_history_capacity() -> usize {
    SpeechOutputConfig::default().history_capacity
}

impl Default for SpeechAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_speech_base_url(),
            synthesis_path: default_synthesis_path(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            synthesis_concurrency: default_synthesis_concurrency(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl SpeechAppConfig {
    /// Settings for the HTTP synthesis gateway
    pub fn synthesis(&self) -> SynthesisConfig {
        SynthesisConfig {
            base_url: self.base_url.clone(),
            synthesis_path: self.synthesis_path.clone(),
            api_key: self.api_key.clone(),
            timeout_ms: self.timeout_ms,
            ..SynthesisConfig::default()
        }
    }

    /// Settings for the speech output pipeline
    pub const fn output(&self) -> SpeechOutputConfig {
        SpeechOutputConfig {
            synthesis_concurrency: self.synthesis_concurrency,
            history_capacity: self.history_capacity,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        self.synthesis().validate()?;
        self.output().validate()
    }
}

/// External audio player invoked once per item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Player executable; audio bytes are written to its stdin
    #[serde(default = "default_player_command")]
    pub player_command: String,

    /// Arguments passed to the player
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
}

fn default_player_command() -> String {
    "ffplay".to_string()
}

fn default_player_args() -> Vec<String> {
    ["-nodisp", "-autoexit", "-loglevel", "quiet", "-"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            player_command: default_player_command(),
            player_args: default_player_args(),
        }
    }
}

impl AudioConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message if no player command is set.
    pub fn validate(&self) -> Result<(), String> {
        if self.player_command.trim().is_empty() {
            return Err("audio.player_command must not be empty".to_string());
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from `path` instead of the default file
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::build(path, environment())
    }

    fn build(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns a message naming the section and the problem.
    pub fn validate(&self) -> Result<(), String> {
        self.stream
            .validate()
            .map_err(|e| format!("stream: {e}"))?;
        self.speech
            .validate()
            .map_err(|e| format!("speech: {e}"))?;
        self.audio.validate().map_err(|e| format!("audio: {e}"))
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(" ")
        .with_list_parse_key("audio.player_args")
}
