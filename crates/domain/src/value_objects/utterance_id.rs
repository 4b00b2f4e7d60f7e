//! Utterance identifier assigned by the server

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one logical spoken response
///
/// Segmented utterances carry it as `utterance_id`, legacy `speak` commands as
/// `say_id`. Both share this type so duplicates across the two paths compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtteranceId(String);

impl UtteranceId {
    /// Create an utterance ID from a server-provided string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UtteranceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UtteranceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for UtteranceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
