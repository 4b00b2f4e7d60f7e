//! Stream client configuration

use serde::{Deserialize, Serialize};

use crate::reconnect::ReconnectConfig;
use crate::transport::StreamEndpoint;

/// Configuration for the push-stream connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Base URL of the kiosk backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the stream endpoint (e.g. `kiosk`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Snapshot message type; defaults to `{endpoint}.snapshot`
    #[serde(default)]
    pub snapshot_type: Option<String>,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Reconnection behavior
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_endpoint() -> String {
    "kiosk".to_string()
}

const fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint: default_endpoint(),
            snapshot_type: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl StreamConfig {
    /// The endpoint described by this configuration
    pub fn stream_endpoint(&self) -> StreamEndpoint {
        let endpoint = StreamEndpoint::named(&self.endpoint);
        match &self.snapshot_type {
            Some(snapshot_type) => endpoint.with_snapshot_type(snapshot_type),
            None => endpoint,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Stream base URL must be http(s), got {}",
                self.base_url
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err("Stream endpoint name cannot be empty".to_string());
        }
        if self.connect_timeout_ms == 0 {
            return Err("Connect timeout must be greater than 0".to_string());
        }
        self.reconnect.validate()
    }
}
