//! Server-sent events transport
//!
//! Opens `GET {base_url}/{endpoint}/stream` with `Accept: text/event-stream`
//! and turns the byte stream into frame bodies: consecutive `data:` lines up to
//! a blank line form one frame. Comments and other SSE fields are ignored.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, instrument, trace};

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::transport::{FrameStream, StreamEndpoint, StreamTransport};

/// Longest unterminated line accepted before the stream is treated as broken
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental decoder for `text/event-stream` bodies
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Buffered bytes already searched for a line break
    scanned: usize,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk of bytes and return every frame it completes
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Read` once a line grows past `MAX_LINE_BYTES`
    /// without a line break; the buffered partial line is discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, StreamError> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buffer[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            let line = &self.buffer[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let line = String::from_utf8_lossy(line).into_owned();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
            start = end + 1;
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            self.buffer.clear();
            self.scanned = 0;
            return Err(StreamError::Read(format!(
                "event stream line exceeds {MAX_LINE_BYTES} bytes"
            )));
        }
        Ok(frames)
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let frame = self.data.join("\n");
            self.data.clear();
            return Some(frame);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field == "data" {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        } else {
            trace!(field = %field, "Ignoring SSE field");
        }
        None
    }
}

/// Push-stream transport over server-sent events
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: Client,
    base_url: String,
}

impl SseTransport {
    /// Create a transport for the configured backend
    ///
    /// # Errors
    ///
    /// Returns `StreamError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: &StreamConfig) -> Result<Self, StreamError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| {
                StreamError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the stream for `endpoint`
    pub fn stream_url(&self, endpoint: &StreamEndpoint) -> String {
        format!("{}/{}/stream", self.base_url, endpoint.name())
    }
}

#[async_trait]
impl StreamTransport for SseTransport {
    #[instrument(skip(self), fields(endpoint = %endpoint.name()))]
    async fn open(&self, endpoint: &StreamEndpoint) -> Result<FrameStream, StreamError> {
        let response = self
            .client
            .get(self.stream_url(endpoint))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::Status(status.as_u16()));
        }
        debug!("Event stream opened");

        let frames = response
            .bytes_stream()
            .scan(SseDecoder::default(), |decoder, chunk| {
                let items: Vec<Result<String, StreamError>> = match chunk {
                    Ok(bytes) => match decoder.feed(&bytes) {
                        Ok(frames) => frames.into_iter().map(Ok).collect(),
                        Err(e) => vec![Err(e)],
                    },
                    Err(e) => vec![Err(StreamError::Read(e.to_string()))],
                };
                futures::future::ready(Some(items))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(frames))
    }
}
