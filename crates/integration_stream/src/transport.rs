//! Stream transport port

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::StreamError;

/// Raw frame bodies read from one open connection
///
/// Yields `Err` on a read failure; ends when the server closes the stream.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, StreamError>> + Send>>;

/// A named push-stream endpoint and the message type of its snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    name: String,
    snapshot_type: String,
}

impl StreamEndpoint {
    /// Endpoint `name` whose snapshots are typed `{name}.snapshot`
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let snapshot_type = format!("{name}.snapshot");
        Self {
            name,
            snapshot_type,
        }
    }

    /// Override the snapshot message type
    #[must_use]
    pub fn with_snapshot_type(mut self, snapshot_type: impl Into<String>) -> Self {
        self.snapshot_type = snapshot_type.into();
        self
    }

    /// Endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message type treated as a snapshot
    pub fn snapshot_type(&self) -> &str {
        &self.snapshot_type
    }
}

/// Port for opening one connection to a push-stream endpoint
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a connection and return its frames
    ///
    /// # Errors
    ///
    /// Returns `StreamError` if the connection could not be established.
    async fn open(&self, endpoint: &StreamEndpoint) -> Result<FrameStream, StreamError>;
}
