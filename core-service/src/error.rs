use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),

    #[error("Device error: {0}")]
    Devices(#[from] core_devices::DeviceError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

impl CoreError {
    /// Returns `true` if the platform refused playback without a user gesture.
    pub fn is_playback_blocked(&self) -> bool {
        matches!(
            self,
            CoreError::Playback(core_playback::PlaybackError::PlaybackBlocked(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
