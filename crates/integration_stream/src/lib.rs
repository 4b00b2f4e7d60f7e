//! Push-stream integration
//!
//! Keeps a long-lived server-sent-events connection to the kiosk backend,
//! routes snapshots and commands to a listener, and reconnects with
//! exponential backoff when the connection drops.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use integration_stream::{
//!     ReconnectConfig, ServerMessage, SseTransport, StreamClient, StreamConfig, StreamListener,
//! };
//! use serde_json::Value;
//!
//! struct Printer;
//!
//! impl StreamListener for Printer {
//!     fn on_snapshot(&self, data: Value) {
//!         println!("snapshot: {data}");
//!     }
//!
//!     fn on_message(&self, message: ServerMessage) {
//!         println!("{}: {}", message.kind, message.data);
//!     }
//! }
//!
//! # async fn run() -> Result<(), integration_stream::StreamError> {
//! let config = StreamConfig::default();
//! let transport = Arc::new(SseTransport::new(&config)?);
//! let handle = StreamClient::connect(
//!     transport,
//!     config.stream_endpoint(),
//!     ReconnectConfig::default(),
//!     Arc::new(Printer),
//! );
//! // ...
//! handle.close();
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod reconnect;
mod sse;
mod transport;

pub use client::{ConnectionState, StreamClient, StreamHandle, StreamListener};
pub use config::StreamConfig;
pub use domain::ServerMessage;
pub use error::StreamError;
pub use reconnect::ReconnectConfig;
pub use sse::{MAX_LINE_BYTES, SseDecoder, SseTransport};
pub use transport::{FrameStream, StreamEndpoint, StreamTransport};
