//! # Resource Codec
//!
//! Turns queued cue sources into device-ready [`AudioSource`] values:
//! normalizes local file paths and decodes inline base64 payloads into
//! bytes.
//!
//! Large payloads are decoded on the blocking pool so a bulky inline clip
//! cannot stall the queue's event loop. Both paths produce identical
//! results.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use bridge_traits::playback::AudioSource;

use crate::config::PlaybackConfig;
use crate::error::{PlaybackQueueError, Result};
use crate::item::CueSource;

/// File extensions eligible for the bare-filename convenience rule.
const AUDIO_EXTENSIONS: [&str; 3] = ["ogg", "mp3", "wav"];

/// Converts cue sources into playable device sources.
#[derive(Debug, Clone)]
pub struct ResourceCodec {
    assets_root: String,
    offload_threshold: usize,
}

impl ResourceCodec {
    /// Creates a codec from the queue configuration.
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            assets_root: config.assets_root.clone(),
            offload_threshold: config.offload_threshold,
        }
    }

    /// Produces the device source for a cue.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackQueueError::Decode`] when an inline payload is not
    /// valid base64.
    pub async fn materialize(&self, source: &CueSource) -> Result<AudioSource> {
        match source {
            CueSource::LocalFile { path } => Ok(AudioSource::LocalFile {
                path: normalize_file_path(path, &self.assets_root),
            }),
            CueSource::InlineEncoded { payload, mime } => {
                let data = self.decode_payload(payload).await?;
                Ok(AudioSource::MemoryBuffer {
                    data,
                    mime: mime.clone(),
                })
            }
        }
    }

    /// Decodes a base64 payload, offloading large ones to the blocking
    /// pool.
    async fn decode_payload(&self, payload: &str) -> Result<Bytes> {
        if payload.len() >= self.offload_threshold {
            tracing::debug!(encoded_len = payload.len(), "Offloading payload decode");
            let owned = payload.to_string();
            tokio::task::spawn_blocking(move || decode_base64(&owned))
                .await
                .map_err(|e| {
                    PlaybackQueueError::Decode(format!("decode task failed: {}", e))
                })?
        } else {
            decode_base64(payload)
        }
    }
}

fn decode_base64(payload: &str) -> Result<Bytes> {
    STANDARD
        .decode(payload.as_bytes())
        .map(Bytes::from)
        .map_err(|e| PlaybackQueueError::Decode(e.to_string()))
}

/// Normalizes a caller-supplied file path.
///
/// Backslashes become forward slashes. A bare audio file name (no
/// directory, recognized audio extension) is resolved under `assets_root`;
/// anything else passes through untouched.
pub fn normalize_file_path(path: &str, assets_root: &str) -> String {
    let normalized = path.replace('\\', "/");
    if is_bare_audio_filename(&normalized) {
        format!("{}/{}", assets_root.trim_end_matches('/'), normalized)
    } else {
        normalized
    }
}

fn is_bare_audio_filename(path: &str) -> bool {
    !path.contains('/') && has_audio_extension(path)
}

fn has_audio_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}
