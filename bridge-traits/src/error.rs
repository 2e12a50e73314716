use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The platform refused to start media playback, usually because no user
    /// gesture is active.
    #[error("Playback refused by platform: {0}")]
    PlaybackRefused(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The payload carries nothing playable.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Decoding failed: {0}")]
    DecodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
