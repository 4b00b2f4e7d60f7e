//! Reconnection backoff
//!
//! Exponential backoff schedule for the push-stream supervisor.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for reconnection behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Reconnect automatically after a transport error
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Initial delay before first retry (in milliseconds)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries (in milliseconds)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Jitter factor (0.0 - 1.0) to add randomness to delays
    #[serde(default = "default_jitter")]
    pub jitter_factor: f64,
}

const fn default_enabled() -> bool {
    true
}

const fn default_initial_delay() -> u64 {
    1000 // 1 second
}

const fn default_max_delay() -> u64 {
    30000 // 30 seconds
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

const fn default_jitter() -> f64 {
    0.0
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter_factor: default_jitter(),
        }
    }
}

impl ReconnectConfig {
    /// Configuration that never reconnects on its own
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Calculate delay for a given attempt number (0-based)
    ///
    /// Attempt 0 waits `initial_delay_ms`; each further attempt multiplies by
    /// `backoff_multiplier`, never exceeding `max_delay_ms` before jitter.
    #[allow(clippy::cast_precision_loss)] // Acceptable for delay calculations
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(30); // Cap exponent to avoid overflow
        let base_delay = self.initial_delay_ms as f64
            * self
                .backoff_multiplier
                .powi(i32::try_from(exponent).unwrap_or(30));
        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let jitter_range = capped_delay * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            // Deterministic jitter based on attempt number
            let jitter_offset = (f64::from(attempt) * 0.7) % 1.0;
            (jitter_offset - 0.5) * 2.0 * jitter_range
        } else {
            0.0
        };

        let final_delay = (capped_delay + jitter).max(0.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Duration::from_millis(final_delay as u64)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_delay_ms == 0 {
            return Err("Reconnect initial delay must be greater than 0".to_string());
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(format!(
                "Reconnect max delay ({}ms) is below the initial delay ({}ms)",
                self.max_delay_ms, self.initial_delay_ms
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "Backoff multiplier must be at least 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(format!(
                "Jitter factor must be between 0.0 and 1.0, got {}",
                self.jitter_factor
            ));
        }
        Ok(())
    }
}
