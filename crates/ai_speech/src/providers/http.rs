//! HTTP synthesis gateway
//!
//! Posts `{ "text": ... }` as JSON to the kiosk backend's synthesis endpoint and
//! returns the raw response body as audio. The response `Content-Type` decides
//! the audio format, falling back to the configured format.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::config::SynthesisConfig;
use crate::error::SpeechError;
use crate::ports::SynthesisGateway;
use crate::types::{AudioData, AudioFormat};

/// Synthesis gateway backed by the kiosk backend's HTTP endpoint
#[derive(Debug, Clone)]
pub struct HttpSynthesisGateway {
    client: Client,
    config: SynthesisConfig,
    url: String,
}

/// Synthesis request body
#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
}

impl HttpSynthesisGateway {
    /// Create a new HTTP synthesis gateway
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid.
    pub fn new(config: SynthesisConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SpeechError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        let url = config.synthesis_url();
        Ok(Self {
            client,
            config,
            url,
        })
    }

    /// The endpoint this gateway posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_transport_error(&self, err: reqwest::Error) -> SpeechError {
        match SpeechError::from(err) {
            SpeechError::Timeout(_) => SpeechError::Timeout(self.config.timeout_ms),
            other => other,
        }
    }

    fn response_format(&self, content_type: Option<&str>) -> AudioFormat {
        content_type
            .and_then(AudioFormat::from_mime_type)
            .unwrap_or(self.config.fallback_format)
    }
}

#[async_trait]
impl SynthesisGateway for HttpSynthesisGateway {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<AudioData, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let mut request = self
            .client
            .post(&self.url)
            .json(&SynthesisRequest { text });
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Synthesis request rejected");
            return Err(SpeechError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let format = self.response_format(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if body.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "Synthesis response body is empty".to_string(),
            ));
        }

        debug!(audio_size = body.len(), format = ?format, "Synthesis complete");
        Ok(AudioData::new(body, format))
    }
}
