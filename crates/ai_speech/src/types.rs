//! Types for speech synthesis
//!
//! Contains the synthesized audio container and its format.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Opus codec
    Opus,
    /// OGG container (typically with Opus or Vorbis codec)
    Ogg,
    /// MP3 format
    Mp3,
    /// WAV format (uncompressed)
    Wav,
    /// FLAC format (lossless)
    Flac,
    /// WebM format
    Webm,
    /// M4A/AAC format
    M4a,
}

impl AudioFormat {
    /// Parse audio format from MIME type
    #[must_use]
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        // Handle compound MIME types like "audio/ogg; codecs=opus"
        let base_mime = mime.split(';').next().unwrap_or(mime).trim();

        match base_mime {
            "audio/opus" => Some(Self::Opus),
            "audio/ogg" => {
                if mime.contains("codecs=opus") {
                    Some(Self::Opus)
                } else {
                    Some(Self::Ogg)
                }
            },
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/webm" => Some(Self::Webm),
            "audio/m4a" | "audio/mp4" | "audio/x-m4a" => Some(Self::M4a),
            _ => None,
        }
    }
}

/// Synthesized audio bytes with their format
///
/// Backed by `Bytes`, so clones share the buffer. The playback slot keeps a
/// clone of the item it hands to the output so a blocked attempt can be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Bytes,
    format: AudioFormat,
}

impl AudioData {
    /// Create new audio data
    #[must_use]
    pub fn new(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    /// Get the raw audio bytes
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the audio format
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Get the size of the audio data in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the audio data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

}
