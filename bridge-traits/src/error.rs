use crate::playback::DeviceFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Playback device not available")]
    DeviceUnavailable,

    #[error("Playback failed: {0}")]
    Playback(DeviceFailure),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// True when the platform refused autonomous playback pending a user
    /// gesture. Callers route these to the unlock flow instead of retrying.
    pub fn is_autoplay_block(&self) -> bool {
        matches!(self, BridgeError::Playback(DeviceFailure::AutoplayBlocked))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
