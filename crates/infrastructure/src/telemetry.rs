//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the filter passed by the caller.

use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

/// Filter used when neither `RUST_LOG` nor a verbosity flag is given
pub const DEFAULT_FILTER: &str =
    "kiosk_speech=info,infrastructure=info,application=info,integration_stream=info,ai_speech=info";

/// Error type for telemetry initialization
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(format: LogFormat, default_filter: &str) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let (text, json) = match format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer().with_target(true)), None),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text)
        .with(json)
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    info!(format = %format, "Tracing initialized");
    Ok(())
}
