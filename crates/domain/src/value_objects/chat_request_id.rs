//! Chat request identifier linking an utterance to the request that produced it

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the chat request an utterance answers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatRequestId(String);

impl ChatRequestId {
    /// Create a chat request ID from a server-provided string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatRequestId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
