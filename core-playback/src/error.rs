//! # Playback Queue Error Types
//!
//! Comprehensive error types for queue and playback operations.
//!
//! Every error here is contained by the queue controller: a failing cue is
//! logged, its session torn down, and draining continues with the next cue.
//! Nothing in this module is expected to propagate out of the event loop.

use bridge_traits::error::BridgeError;
use bridge_traits::playback::DeviceFailure;
use thiserror::Error;

/// Errors that can occur during queue and playback operations.
#[derive(Error, Debug)]
pub enum PlaybackQueueError {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Enqueue request failed validation and was dropped at the boundary.
    #[error("Invalid cue: {0}")]
    Validation(String),

    /// Inline payload could not be decoded into playable bytes.
    #[error("Failed to decode inline payload: {0}")]
    Decode(String),

    /// The playback device rejected the source kind.
    #[error("Unsupported source kind: {0}")]
    UnsupportedKind(String),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Autoplay policy blocked the final play attempt while audio was
    /// still locked.
    #[error("Playback blocked by autoplay policy")]
    PlaybackBlocked,

    /// The play retry budget was exhausted without audible playback.
    #[error("Playback failed after {attempts} attempts: {failure}")]
    Playback {
        /// Play attempts consumed before giving up.
        attempts: u32,
        /// The failure reported on the final attempt.
        failure: DeviceFailure,
    },

    // ========================================================================
    // Platform Errors
    // ========================================================================
    /// A bridge operation failed outside a play attempt.
    #[error("Device error: {0}")]
    Device(#[from] BridgeError),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// The controller was assembled with an invalid or incomplete
    /// configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PlaybackQueueError {
    /// Returns `true` if this error means the session is waiting on a user
    /// unlock gesture rather than having failed outright.
    pub fn is_blocked(&self) -> bool {
        matches!(self, PlaybackQueueError::PlaybackBlocked)
    }

    /// Returns `true` if this error indicates a caller-side defect (bad
    /// input or bad wiring) rather than a runtime playback failure.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            PlaybackQueueError::Validation(_)
                | PlaybackQueueError::UnsupportedKind(_)
                | PlaybackQueueError::Config(_)
        )
    }

    /// Returns `true` if this error terminated a playback session.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            PlaybackQueueError::PlaybackBlocked
                | PlaybackQueueError::Playback { .. }
                | PlaybackQueueError::Device(_)
        )
    }

    /// Stable short name of the error class, for events and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            PlaybackQueueError::Validation(_) => "validation",
            PlaybackQueueError::Decode(_) => "decode",
            PlaybackQueueError::UnsupportedKind(_) => "unsupported-kind",
            PlaybackQueueError::PlaybackBlocked => "blocked",
            PlaybackQueueError::Playback { .. } => "playback",
            PlaybackQueueError::Device(_) => "device",
            PlaybackQueueError::Config(_) => "config",
        }
    }
}

/// Result type for queue and playback operations.
pub type Result<T> = std::result::Result<T, PlaybackQueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_is_not_a_defect() {
        let err = PlaybackQueueError::PlaybackBlocked;
        assert!(err.is_blocked());
        assert!(err.is_session_error());
        assert!(!err.is_defect());
    }

    #[test]
    fn validation_is_a_defect() {
        let err = PlaybackQueueError::Validation("empty path".to_string());
        assert!(err.is_defect());
        assert!(!err.is_session_error());
    }

    #[test]
    fn bridge_errors_convert() {
        let err: PlaybackQueueError = BridgeError::DeviceUnavailable.into();
        assert!(err.is_session_error());
        assert_eq!(err.to_string(), "Device error: Playback device not available");
    }

    #[test]
    fn exhausted_session_reports_attempts() {
        let err = PlaybackQueueError::Playback {
            attempts: 3,
            failure: DeviceFailure::Network,
        };
        assert!(err.to_string().contains("after 3 attempts"));
        assert_eq!(err.reason(), "playback");
    }
}
