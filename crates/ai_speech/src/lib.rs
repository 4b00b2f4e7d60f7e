//! AI Speech - Text-to-Speech synthesis for the kiosk
//!
//! Provides the synthesis port used by the speech output pipeline:
//! - `SynthesisGateway` - Synthesize speech from text
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the trait (port)
//! - `providers` module contains concrete implementations (adapters)
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{HttpSynthesisGateway, SynthesisConfig, SynthesisGateway};
//!
//! let gateway = HttpSynthesisGateway::new(SynthesisConfig::default())?;
//! let audio = gateway.synthesize("Hello, world!").await?;
//! ```

pub mod config;
pub mod error;
pub mod ports;
pub mod providers;
pub mod types;

pub use config::SynthesisConfig;
pub use error::SpeechError;
pub use ports::SynthesisGateway;
pub use providers::http::HttpSynthesisGateway;
pub use types::{AudioData, AudioFormat};
