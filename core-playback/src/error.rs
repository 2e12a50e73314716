//! # Playback Error Types
//!
//! Error taxonomy for content preparation and graph operations.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during preparation or playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The payload carries nothing playable (no bytes, empty text, empty blob).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Bytes could not be decoded to PCM. Recoverable: the fallback route
    /// still plays the same bytes.
    #[error("Decoding failed: {0}")]
    DecodeFailure(String),

    /// Reading a blob's bytes failed.
    #[error("Failed to acquire audio bytes: {0}")]
    AcquisitionFailure(String),

    /// The platform refused to start playback without a user gesture.
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    /// The audio-processing context could not be created.
    #[error("Audio context unavailable: {0}")]
    ContextUnavailable(String),

    /// A newer request began before this one could commit.
    #[error("Request {generation} superseded by a newer request")]
    Superseded { generation: u64 },

    #[error("Platform error: {0}")]
    Platform(BridgeError),
}

impl From<BridgeError> for PlaybackError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::InvalidPayload(reason) => PlaybackError::InvalidPayload(reason),
            BridgeError::DecodeFailed(reason) => PlaybackError::DecodeFailure(reason),
            other => PlaybackError::Platform(other),
        }
    }
}

impl PlaybackError {
    /// Returns `true` if the request lost to a newer one rather than failing.
    pub fn is_superseded(&self) -> bool {
        matches!(self, PlaybackError::Superseded { .. })
    }

    /// Returns `true` if the caller can still play something after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::DecodeFailure(_) | PlaybackError::PlaybackBlocked(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
