//! Value Objects - Immutable, identity-less domain primitives

mod chat_request_id;
mod utterance_id;

pub use chat_request_id::ChatRequestId;
pub use utterance_id::UtteranceId;
