//! Playback device bridge trait and supporting audio types.
//!
//! The core drives exactly one host audio output through [`PlaybackDevice`].
//! Host applications provide the concrete implementation (a media element on
//! web hosts, a native audio engine elsewhere) and report lifecycle
//! transitions back over the device event channel.

use crate::error::Result;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;

/// Longest label emitted into diagnostics before truncation.
const MAX_LABEL_LEN: usize = 96;

/// Audio source descriptor handed to the playback device.
///
/// Paths are forward-slash locators resolved by the host (relative locators
/// are resolved against the host's asset root), not native filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    /// Local file or asset reachable by the host runtime.
    LocalFile { path: String },
    /// In-memory audio buffer decoded by the caller, with its mime type.
    MemoryBuffer { data: Bytes, mime: String },
}

impl AudioSource {
    /// Whether the source is an in-memory buffer.
    pub fn is_buffer(&self) -> bool {
        matches!(self, AudioSource::MemoryBuffer { .. })
    }

    /// Short identifier for diagnostics. Long paths are truncated.
    pub fn label(&self) -> String {
        match self {
            AudioSource::LocalFile { path } => truncate_label(path),
            AudioSource::MemoryBuffer { data, mime } => {
                format!("buffer:{} bytes ({})", data.len(), mime)
            }
        }
    }
}

fn truncate_label(value: &str) -> String {
    if value.len() <= MAX_LABEL_LEN {
        value.to_string()
    } else {
        let cut = value
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LABEL_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(MAX_LABEL_LEN);
        format!("{}…", &value[..cut])
    }
}

/// Reason a device rejected or aborted playback.
///
/// The numeric mapping follows the conventional media element error codes
/// (1 = aborted, 2 = network, 3 = decode, 4 = source unsupported) so host
/// adapters can pass codes through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum DeviceFailure {
    /// The platform requires a user gesture before autonomous playback.
    AutoplayBlocked,
    /// Fetch or decode was aborted by the host.
    Aborted,
    /// The host could not fetch the source.
    Network,
    /// The source was fetched but could not be decoded.
    Decode,
    /// The source kind or container is not playable on this device.
    SourceUnsupported,
    /// Anything the host could not classify.
    Other { detail: String },
}

impl DeviceFailure {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => DeviceFailure::Aborted,
            2 => DeviceFailure::Network,
            3 => DeviceFailure::Decode,
            4 => DeviceFailure::SourceUnsupported,
            other => DeviceFailure::Other {
                detail: format!("error code {}", other),
            },
        }
    }

    /// Numeric code for diagnostics, when the failure maps to one.
    pub fn code(&self) -> Option<u32> {
        match self {
            DeviceFailure::Aborted => Some(1),
            DeviceFailure::Network => Some(2),
            DeviceFailure::Decode => Some(3),
            DeviceFailure::SourceUnsupported => Some(4),
            DeviceFailure::AutoplayBlocked | DeviceFailure::Other { .. } => None,
        }
    }

    pub fn is_autoplay_block(&self) -> bool {
        matches!(self, DeviceFailure::AutoplayBlocked)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceFailure::AutoplayBlocked => "autoplay-blocked",
            DeviceFailure::Aborted => "aborted",
            DeviceFailure::Network => "network",
            DeviceFailure::Decode => "decode",
            DeviceFailure::SourceUnsupported => "source-unsupported",
            DeviceFailure::Other { .. } => "other",
        }
    }
}

impl std::fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceFailure::Other { detail } => write!(f, "other ({})", detail),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Lifecycle event emitted by a playback device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DeviceEvent {
    /// Audible playback has begun.
    Started,
    /// The current source played to completion.
    Ended,
    /// Playback aborted with a failure.
    Failed { failure: DeviceFailure },
}

impl DeviceEvent {
    pub fn description(&self) -> String {
        match self {
            DeviceEvent::Started => "Playback started".to_string(),
            DeviceEvent::Ended => "Playback ended".to_string(),
            DeviceEvent::Failed { failure } => format!("Playback failed: {}", failure),
        }
    }
}

/// Host-side buffering activity, reported for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferingState {
    Empty,
    Idle,
    Loading,
    NoSource,
}

impl BufferingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BufferingState::Empty => "empty",
            BufferingState::Idle => "idle",
            BufferingState::Loading => "loading",
            BufferingState::NoSource => "no-source",
        }
    }
}

/// How much of the bound source the device has ready to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadinessState {
    Nothing,
    Metadata,
    CurrentData,
    FutureData,
    EnoughData,
}

impl ReadinessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessState::Nothing => "nothing",
            ReadinessState::Metadata => "metadata",
            ReadinessState::CurrentData => "current-data",
            ReadinessState::FutureData => "future-data",
            ReadinessState::EnoughData => "enough-data",
        }
    }

    /// Playback can proceed at the current position.
    pub fn has_current_data(&self) -> bool {
        *self >= ReadinessState::CurrentData
    }
}

/// Device state snapshot consulted when a playback error is reported.
#[derive(Debug, Clone)]
pub struct DeviceDiagnostics {
    /// Identifier of the currently bound source, if any.
    pub source: Option<String>,
    /// Raw error code reported by the host, if any.
    pub error_code: Option<u32>,
    pub buffering: BufferingState,
    pub readiness: ReadinessState,
}

impl Default for DeviceDiagnostics {
    fn default() -> Self {
        Self {
            source: None,
            error_code: None,
            buffering: BufferingState::Empty,
            readiness: ReadinessState::Nothing,
        }
    }
}

/// Trait for the single host audio output the core drives.
///
/// Implementations own the native playback resource exclusively; the core
/// never touches more than one device. `load` binds a source and should start
/// any buffering the host supports, in the manner of a preload hint. `play`
/// resolves once audible playback has actually begun and fails with
/// [`BridgeError::Playback`] carrying [`DeviceFailure::AutoplayBlocked`] when
/// the platform demands a user gesture first.
///
/// Lifecycle transitions (start, end of stream, asynchronous failures) are
/// delivered over the broadcast channel returned by `subscribe_events`; the
/// device keeps emitting regardless of subscriber count.
#[async_trait::async_trait]
pub trait PlaybackDevice: Send + Sync {
    /// Bind a source as the device's current stream and begin preloading.
    async fn load(&self, source: AudioSource) -> Result<()>;

    /// Start playback of the bound source.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the source bound.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position within the bound source.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Adjust output volume, normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Mute or unmute output without touching the volume setting.
    async fn set_muted(&self, muted: bool) -> Result<()>;

    /// Subscribe to device lifecycle events.
    fn subscribe_events(&self) -> broadcast::Receiver<DeviceEvent>;

    /// Snapshot of device state for error diagnostics.
    async fn diagnostics(&self) -> DeviceDiagnostics;

    /// Whether the device is usable at all. Hosts report `false` when the
    /// underlying output has not been provisioned.
    fn is_available(&self) -> bool {
        true
    }
}
