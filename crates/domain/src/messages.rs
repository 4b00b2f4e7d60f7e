//! Inbound push-stream frames

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

/// One frame pushed by the server: `{ type, seq, data }`
///
/// Consumed immediately by whoever receives it; never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Message type, e.g. `kiosk.snapshot` or `speech.segment`
    #[serde(rename = "type")]
    pub kind: String,
    /// Server-side sequence number
    #[serde(default)]
    pub seq: u64,
    /// Type-specific payload
    #[serde(default)]
    pub data: Value,
}

impl ServerMessage {
    /// Create a message
    pub fn new(kind: impl Into<String>, seq: u64, data: Value) -> Self {
        Self {
            kind: kind.into(),
            seq,
            data,
        }
    }

    /// Parse a raw frame body
    ///
    /// Only two things reject a frame: a body that is not JSON, and a missing or
    /// non-string `type`. A missing or non-integral `seq` reads as 0 and a missing
    /// `data` as `null`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedFrame` if the frame must be dropped.
    pub fn parse(frame: &str) -> Result<Self, DomainError> {
        let value: Value = serde_json::from_str(frame)
            .map_err(|e| DomainError::MalformedFrame(format!("JSON parse error: {e}")))?;

        let Value::Object(mut fields) = value else {
            return Err(DomainError::MalformedFrame(
                "frame is not a JSON object".to_string(),
            ));
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => {
                return Err(DomainError::MalformedFrame(
                    "frame has no string `type`".to_string(),
                ));
            },
        };
        let seq = fields.get("seq").and_then(Value::as_u64).unwrap_or(0);
        let data = fields.remove("data").unwrap_or(Value::Null);

        Ok(Self { kind, seq, data })
    }

    /// Whether this frame is the stream's snapshot
    pub fn is_snapshot(&self, snapshot_type: &str) -> bool {
        self.kind == snapshot_type
    }
}
