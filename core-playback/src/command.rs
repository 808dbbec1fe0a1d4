//! # Command Surface
//!
//! Inbound command shapes, deserialized at the host boundary and converted
//! into queue controller calls. Transport is the host's concern; anything
//! that can hand the controller a [`Command`] can drive the queue.

use serde::{Deserialize, Serialize};

/// An inbound control command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Queue a local audio file.
    EnqueueFile {
        /// File path; bare audio names resolve under the assets root.
        path: String,
        /// Playback volume, clamped into `[0.0, 1.0]`. Defaults to full.
        #[serde(default)]
        volume: Option<f32>,
        /// Drain priority. Defaults to 0.
        #[serde(default)]
        priority: Option<i32>,
    },
    /// Queue an inline base64 payload.
    EnqueueEncoded {
        /// Base64-encoded audio bytes.
        payload: String,
        /// MIME type of the decoded bytes. Defaults to `audio/mpeg`.
        #[serde(default)]
        mime: Option<String>,
        /// Playback volume, clamped into `[0.0, 1.0]`. Defaults to full.
        #[serde(default)]
        volume: Option<f32>,
        /// Drain priority. Defaults to 0.
        #[serde(default)]
        priority: Option<i32>,
    },
    /// Stop playback and drop every pending cue.
    Stop,
    /// Same effect as [`Command::Stop`]; kept as a distinct wire verb.
    ClearAll,
    /// Present the unlock prompt without queueing anything.
    RequestUnlock,
}

impl Command {
    /// Wire name of the command, for logs.
    pub fn describe(&self) -> &'static str {
        match self {
            Command::EnqueueFile { .. } => "enqueue-file",
            Command::EnqueueEncoded { .. } => "enqueue-encoded",
            Command::Stop => "stop",
            Command::ClearAll => "clear-all",
            Command::RequestUnlock => "request-unlock",
        }
    }
}

/// What a handled command resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandOutcome {
    /// An enqueue command was processed; `accepted` is false when the cue
    /// failed validation.
    Enqueued {
        /// Whether the cue entered the store.
        accepted: bool,
    },
    /// The queue was force-cleared.
    Cleared,
    /// The unlock flow was started (or was already resolved).
    UnlockRequested,
}
