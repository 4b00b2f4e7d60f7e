//! Configuration for speech synthesis

use serde::{Deserialize, Serialize};

use crate::types::AudioFormat;

/// Configuration for the HTTP synthesis gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Base URL of the kiosk backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the synthesis endpoint, appended to `base_url`
    #[serde(default = "default_synthesis_path")]
    pub synthesis_path: String,

    /// Optional bearer token sent with each request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Format assumed when the response has no usable content type
    #[serde(default = "default_fallback_format")]
    pub fallback_format: AudioFormat,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_synthesis_path() -> String {
    "/api/tts".to_string()
}

const fn default_fallback_format() -> AudioFormat {
    AudioFormat::Mp3
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            synthesis_path: default_synthesis_path(),
            api_key: None,
            fallback_format: default_fallback_format(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl SynthesisConfig {
    /// Full URL of the synthesis endpoint
    pub fn synthesis_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.synthesis_path.trim_start_matches('/')
        )
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Synthesis base URL must be http(s), got {}",
                self.base_url
            ));
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = SynthesisConfig::default();

        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.synthesis_path, "/api/tts");
        assert!(config.api_key.is_none());
        assert_eq!(config.fallback_format, AudioFormat::Mp3);
        assert_eq!(config.timeout_ms, 30000);
    }

    #[test]
    fn synthesis_url_joins_without_double_slash() {
        let config = SynthesisConfig {
            base_url: "http://kiosk.local/".to_string(),
            synthesis_path: "/api/tts".to_string(),
            ..Default::default()
        };
        assert_eq!(config.synthesis_url(), "http://kiosk.local/api/tts");
    }

    #[test]
    fn validate_succeeds_with_defaults() {
        assert!(SynthesisConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_fails_with_zero_timeout() {
        let config = SynthesisConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fails_with_non_http_url() {
        let config = SynthesisConfig {
            base_url: "ftp://kiosk".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            base_url = "https://backend.example"
            synthesis_path = "/v2/speech"
            fallback_format = "wav"
            timeout_ms = 5000
        "#;

        let config: SynthesisConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.base_url, "https://backend.example");
        assert_eq!(config.synthesis_path, "/v2/speech");
        assert_eq!(config.fallback_format, AudioFormat::Wav);
        assert_eq!(config.timeout_ms, 5000);
    }
}
