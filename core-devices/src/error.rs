use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device API unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to install device shim: {0}")]
    InstallFailed(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
