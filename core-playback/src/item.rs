//! # Queue Items
//!
//! The validated unit of work held by the queue store: one audio cue with
//! its source, playback volume, and drain priority.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{PlaybackQueueError, Result};

/// Volume applied when the caller does not specify one.
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Fallback MIME type for inline payloads that arrive without one.
pub const DEFAULT_INLINE_MIME: &str = "audio/mpeg";

/// Where a cue's audio comes from.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CueSource {
    /// An audio file shipped with the host, addressed by path.
    LocalFile {
        /// Path as supplied by the caller, normalized at materialization.
        path: String,
    },
    /// Base64-encoded audio delivered inline.
    InlineEncoded {
        /// Base64 payload.
        payload: String,
        /// MIME type of the decoded bytes.
        mime: String,
    },
}

/// Coarse cue classification, used in events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CueKind {
    /// Local file source
    File,
    /// Inline encoded source
    Encoded,
}

impl CueKind {
    /// Stable string form for events and structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CueKind::File => "file",
            CueKind::Encoded => "encoded",
        }
    }
}

/// One pending audio cue.
///
/// Construct through [`QueueItem::local_file`] or
/// [`QueueItem::inline_encoded`]; both clamp volume into `[0.0, 1.0]` and
/// default priority to `0`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueueItem {
    /// Audio source for this cue.
    pub source: CueSource,
    /// Playback volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// Drain priority. Higher values drain first; equal values keep
    /// arrival order.
    pub priority: i32,
    /// When the cue was created.
    pub enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    /// Creates a cue for a local audio file.
    pub fn local_file(path: impl Into<String>) -> Self {
        Self {
            source: CueSource::LocalFile { path: path.into() },
            volume: DEFAULT_VOLUME,
            priority: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Creates a cue for a base64-encoded inline payload.
    ///
    /// The MIME type defaults to [`DEFAULT_INLINE_MIME`]; override with
    /// [`QueueItem::with_mime`].
    pub fn inline_encoded(payload: impl Into<String>) -> Self {
        Self {
            source: CueSource::InlineEncoded {
                payload: payload.into(),
                mime: DEFAULT_INLINE_MIME.to_string(),
            },
            volume: DEFAULT_VOLUME,
            priority: 0,
            enqueued_at: Utc::now(),
        }
    }

    /// Sets the playback volume, clamped into `[0.0, 1.0]`.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = clamp_volume(volume);
        self
    }

    /// Sets the drain priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the MIME type of an inline payload. No effect on file cues.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        if let CueSource::InlineEncoded { mime: slot, .. } = &mut self.source {
            *slot = mime.into();
        }
        self
    }

    /// Returns the coarse kind of this cue.
    pub fn kind(&self) -> CueKind {
        match self.source {
            CueSource::LocalFile { .. } => CueKind::File,
            CueSource::InlineEncoded { .. } => CueKind::Encoded,
        }
    }

    /// Checks that the cue is playable at all.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackQueueError::Validation`] for empty paths, empty
    /// payloads, or a blank MIME type.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            CueSource::LocalFile { path } => {
                if path.trim().is_empty() {
                    return Err(PlaybackQueueError::Validation(
                        "file cue requires a non-empty path".to_string(),
                    ));
                }
            }
            CueSource::InlineEncoded { payload, mime } => {
                if payload.trim().is_empty() {
                    return Err(PlaybackQueueError::Validation(
                        "encoded cue requires a non-empty payload".to_string(),
                    ));
                }
                if mime.trim().is_empty() {
                    return Err(PlaybackQueueError::Validation(
                        "encoded cue requires a MIME type".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Clamps a requested volume into the playable range.
///
/// NaN falls back to the default volume rather than poisoning the device.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return DEFAULT_VOLUME;
    }
    volume.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_cue_defaults() {
        let item = QueueItem::local_file("chime.ogg");
        assert_eq!(item.kind(), CueKind::File);
        assert_eq!(item.volume, DEFAULT_VOLUME);
        assert_eq!(item.priority, 0);
        assert!(item.validate().is_ok());
    }

    #[test]
    fn encoded_cue_defaults_mime() {
        let item = QueueItem::inline_encoded("AAAA");
        assert_eq!(item.kind(), CueKind::Encoded);
        match &item.source {
            CueSource::InlineEncoded { mime, .. } => assert_eq!(mime, DEFAULT_INLINE_MIME),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(QueueItem::local_file("a.ogg").with_volume(1.8).volume, 1.0);
        assert_eq!(QueueItem::local_file("a.ogg").with_volume(-0.2).volume, 0.0);
        assert_eq!(QueueItem::local_file("a.ogg").with_volume(0.5).volume, 0.5);
        assert_eq!(
            QueueItem::local_file("a.ogg").with_volume(f32::NAN).volume,
            DEFAULT_VOLUME
        );
    }

    #[test]
    fn mime_override_ignores_file_cues() {
        let item = QueueItem::local_file("a.ogg").with_mime("audio/ogg");
        assert_eq!(item.source, CueSource::LocalFile { path: "a.ogg".into() });

        let item = QueueItem::inline_encoded("AAAA").with_mime("audio/ogg");
        match &item.source {
            CueSource::InlineEncoded { mime, .. } => assert_eq!(mime, "audio/ogg"),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn empty_sources_fail_validation() {
        assert!(QueueItem::local_file("").validate().is_err());
        assert!(QueueItem::local_file("   ").validate().is_err());
        assert!(QueueItem::inline_encoded("").validate().is_err());
        assert!(QueueItem::inline_encoded("AAAA")
            .with_mime("")
            .validate()
            .is_err());
    }

    #[test]
    fn priority_builder_sets_value() {
        let item = QueueItem::local_file("a.ogg").with_priority(-3);
        assert_eq!(item.priority, -3);
    }
}
