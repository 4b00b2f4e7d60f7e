//! Port definitions for speech synthesis
//!
//! Defines the trait (port) that synthesis adapters must implement.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::SpeechError;
use crate::types::AudioData;

/// Port for the synthesis gateway
///
/// Turns a text string into audio bytes. Latency and completion order are not
/// under the caller's control; several calls may be in flight at once and may
/// resolve in any order.
///
/// # Example
///
/// ```ignore
/// use ai_speech::{SynthesisGateway, SpeechError};
///
/// async fn say(gateway: &impl SynthesisGateway, text: &str) -> Result<usize, SpeechError> {
///     let audio = gateway.synthesize(text).await?;
///     Ok(audio.size_bytes())
/// }
/// ```
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SynthesisGateway: Send + Sync {
    /// Synthesize `text` into audio
    ///
    /// # Errors
    ///
    /// Returns a network-level `SpeechError` (`ConnectionFailed`, `RequestFailed`,
    /// `Timeout`) when no response arrived, or `SpeechError::Status` for a
    /// non-success response.
    async fn synthesize(&self, text: &str) -> Result<AudioData, SpeechError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AudioFormat;

    #[tokio::test]
    async fn mock_gateway_synthesizes() {
        let mut gateway = MockSynthesisGateway::new();
        gateway
            .expect_synthesize()
            .with(mockall::predicate::eq("Hello"))
            .times(1)
            .returning(|_| Ok(AudioData::new(vec![0u8, 1, 2, 3], AudioFormat::Mp3)));

        let audio = gateway.synthesize("Hello").await.unwrap();
        assert_eq!(audio.size_bytes(), 4);
    }

    #[tokio::test]
    async fn mock_gateway_reports_status() {
        let mut gateway = MockSynthesisGateway::new();
        gateway.expect_synthesize().returning(|_| {
            Err(SpeechError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            })
        });

        let err = gateway.synthesize("Hello").await.unwrap_err();
        assert_eq!(err.status(), Some(502));
    }

    #[tokio::test]
    async fn gateway_is_object_safe() {
        let mut gateway = MockSynthesisGateway::new();
        gateway
            .expect_synthesize()
            .returning(|_| Err(SpeechError::ConnectionFailed("down".to_string())));
        let gateway: std::sync::Arc<dyn SynthesisGateway> = std::sync::Arc::new(gateway);

        assert!(gateway.synthesize("x").await.unwrap_err().is_network());
    }
}
