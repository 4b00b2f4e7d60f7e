//! Application layer - Speech output use case
//!
//! Turns the ordered stream of speech commands into synthesized audio played
//! strictly in utterance order. The core is a synchronous state machine
//! ([`SpeechPipeline`]) that emits effects; [`SpeechOutputService`] runs it on
//! an event loop and executes those effects against the ports.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
