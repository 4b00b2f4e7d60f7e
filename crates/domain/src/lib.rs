//! Domain layer for the kiosk speech output pipeline
//!
//! Contains the inbound stream frame, the typed speech commands carried in it,
//! the identifiers they reference, and domain errors. This layer performs no I/O.

pub mod commands;
pub mod errors;
pub mod messages;
pub mod value_objects;

pub use commands::{SpeechCommand, SpeechCommandKind};
pub use errors::DomainError;
pub use messages::ServerMessage;
pub use value_objects::*;
