//! Speech output tuning

/// Configuration for the speech output pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechOutputConfig {
    /// Maximum synthesis calls in flight for the active utterance
    pub synthesis_concurrency: usize,
    /// Number of finished utterance ids remembered for de-duplication
    pub history_capacity: usize,
}

impl Default for SpeechOutputConfig {
    fn default() -> Self {
        Self {
            synthesis_concurrency: 3,
            history_capacity: 128,
        }
    }
}

impl SpeechOutputConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error message if a limit is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.synthesis_concurrency == 0 {
            return Err("synthesis_concurrency must be at least 1".to_string());
        }
        if self.history_capacity == 0 {
            return Err("history_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
