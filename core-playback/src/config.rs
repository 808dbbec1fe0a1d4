//! # Playback Queue Configuration
//!
//! Configuration types for the queue controller and playback driver.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback queue configuration.
///
/// Controls queue capacity, retry behavior, error-recovery pacing, and the
/// inline payload offload threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Maximum number of pending cues held at once.
    ///
    /// When a new cue arrives while the store is full, the oldest pending
    /// cue is evicted to make room.
    ///
    /// Default: 10.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Maximum play attempts per session before giving up.
    ///
    /// Default: 3.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base delay for the linear retry backoff.
    ///
    /// Attempt `n` waits `n * retry_base_delay` before retrying.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay: Duration,

    /// Delay before the queue resumes draining after a contained error.
    ///
    /// Default: 50 ms.
    #[serde(default = "default_recovery_drain_delay")]
    pub recovery_drain_delay: Duration,

    /// Inline payload size (in bytes) above which decoding is handed to the
    /// off-task seam.
    ///
    /// Default: 1 MB.
    #[serde(default = "default_offload_threshold")]
    pub offload_threshold: usize,

    /// Directory prepended to bare audio file names.
    ///
    /// Default: `assets`.
    #[serde(default = "default_assets_root")]
    pub assets_root: String,

    /// Source played (muted) to satisfy the unlock gesture requirement.
    ///
    /// Default: `assets/unlock-ping.ogg`.
    #[serde(default = "default_unlock_ping_source")]
    pub unlock_ping_source: String,

    /// Buffer size of the core event bus.
    ///
    /// Default: 64.
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
            retry_limit: default_retry_limit(),
            retry_base_delay: default_retry_base_delay(),
            recovery_drain_delay: default_recovery_drain_delay(),
            offload_threshold: default_offload_threshold(),
            assets_root: default_assets_root(),
            unlock_ping_source: default_unlock_ping_source(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}

impl PlaybackConfig {
    /// Create a configuration tuned for short interactive cues.
    ///
    /// - Faster retry backoff (25 ms base)
    /// - Shorter error-recovery pause (10 ms)
    pub fn low_latency() -> Self {
        Self {
            retry_base_delay: Duration::from_millis(25),
            recovery_drain_delay: Duration::from_millis(10),
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_queue_size == 0 {
            return Err("max_queue_size must be > 0".to_string());
        }

        if self.retry_limit == 0 {
            return Err("retry_limit must be > 0".to_string());
        }

        if self.event_buffer_size == 0 {
            return Err("event_buffer_size must be > 0".to_string());
        }

        if self.assets_root.is_empty() {
            return Err("assets_root must not be empty".to_string());
        }

        if self.unlock_ping_source.is_empty() {
            return Err("unlock_ping_source must not be empty".to_string());
        }

        Ok(())
    }

    /// Backoff delay before the attempt after `attempt` (1-based) failed.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base_delay * attempt
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_max_queue_size() -> usize {
    10
}

fn default_retry_limit() -> u32 {
    3
}

fn default_retry_base_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_recovery_drain_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_offload_threshold() -> usize {
    1_000_000 // 1 MB
}

fn default_assets_root() -> String {
    "assets".to_string()
}

fn default_unlock_ping_source() -> String {
    "assets/unlock-ping.ogg".to_string()
}

fn default_event_buffer_size() -> usize {
    64
}
