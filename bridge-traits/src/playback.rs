//! Audio content types shared between the control channel, the content
//! preparer and the platform adapters.
//!
//! A set-content request carries exactly one [`AudioPayload`] variant. Payloads
//! that reference platform objects (blobs) do so through the [`BlobHandle`]
//! trait so the core never touches browser types directly.

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Opaque reference to a platform byte blob (e.g. a browser `Blob`).
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait BlobHandle: PlatformSendSync + fmt::Debug {
    /// MIME type recorded on the blob, if the platform knows one.
    fn mime_type(&self) -> Option<String>;

    /// Read the full contents of the blob.
    async fn read_bytes(&self) -> Result<Bytes>;
}

/// Audio content handed to the engine by a set-content request.
#[derive(Clone)]
pub enum AudioPayload {
    /// Encoded audio bytes with an optional MIME hint.
    Bytes {
        bytes: Bytes,
        mime_hint: Option<String>,
    },
    /// Platform blob whose bytes must be read asynchronously.
    Blob { handle: Arc<dyn BlobHandle> },
    /// Plain text; playback goes through a remote speech URL.
    Text { text: String },
}

impl AudioPayload {
    pub fn bytes(bytes: impl Into<Bytes>, mime_hint: Option<String>) -> Self {
        AudioPayload::Bytes {
            bytes: bytes.into(),
            mime_hint,
        }
    }

    pub fn blob(handle: Arc<dyn BlobHandle>) -> Self {
        AudioPayload::Blob { handle }
    }

    pub fn text(text: impl Into<String>) -> Self {
        AudioPayload::Text { text: text.into() }
    }

    /// Short variant name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AudioPayload::Bytes { .. } => "bytes",
            AudioPayload::Blob { .. } => "blob",
            AudioPayload::Text { .. } => "text",
        }
    }

    /// Reject payloads that can be seen to be empty without reading them.
    ///
    /// Blobs always pass; their size is only known once read.
    pub fn validate(&self) -> Result<()> {
        match self {
            AudioPayload::Bytes { bytes, .. } if bytes.is_empty() => Err(
                BridgeError::InvalidPayload("bytes payload has no bytes".to_string()),
            ),
            AudioPayload::Text { text } if text.trim().is_empty() => {
                Err(BridgeError::InvalidPayload("text is empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioPayload::Bytes { bytes, mime_hint } => f
                .debug_struct("Bytes")
                .field("len", &bytes.len())
                .field("mime_hint", mime_hint)
                .finish(),
            AudioPayload::Blob { handle } => f.debug_struct("Blob").field("handle", handle).finish(),
            AudioPayload::Text { text } => f
                .debug_struct("Text")
                .field("chars", &text.chars().count())
                .finish(),
        }
    }
}

/// Decodes a complete in-memory file to PCM.
///
/// Browsers decode off the main thread through `decodeAudioData`; native hosts
/// decode in process.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioDecoder: PlatformSendSync {
    /// Decode `bytes`, using `mime_hint` to guide container detection.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DecodeFailed`] if the format is not recognized
    /// or no audio frames could be decoded.
    async fn decode(&self, bytes: &Bytes, mime_hint: Option<&str>) -> Result<DecodedAudio>;
}

/// Fully decoded PCM held in memory, one `Vec<f32>` per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Planar samples in the range `[-1.0, 1.0]`.
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }
}
