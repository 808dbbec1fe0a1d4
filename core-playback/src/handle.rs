//! # Playback Handles
//!
//! A handle represents one source bound to the playback device. Binding a
//! new source always releases the previous handle first, so at most one
//! live handle exists at a time and each is released exactly once.

use std::fmt;

use bridge_traits::playback::AudioSource;
use uuid::Uuid;

/// Unique identifier of a playback handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A source currently or previously bound to the playback device.
#[derive(Debug)]
pub struct PlaybackHandle {
    id: HandleId,
    source: AudioSource,
    released: bool,
}

impl PlaybackHandle {
    /// Creates a live handle for a source about to be bound.
    pub fn new(source: AudioSource) -> Self {
        Self {
            id: HandleId::new(),
            source,
            released: false,
        }
    }

    /// Identifier of this handle.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The bound source.
    pub fn source(&self) -> &AudioSource {
        &self.source
    }

    /// Diagnostic label of the bound source.
    pub fn label(&self) -> String {
        self.source.label()
    }

    /// Whether this handle has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Releases the handle.
    ///
    /// Returns `true` on the call that actually released it; later calls
    /// return `false` and do nothing.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        true
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(handle = %self.id, "Playback handle dropped without release");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> PlaybackHandle {
        PlaybackHandle::new(AudioSource::LocalFile {
            path: "assets/chime.ogg".to_string(),
        })
    }

    #[test]
    fn release_happens_exactly_once() {
        let mut h = handle();
        assert!(!h.is_released());
        assert!(h.release());
        assert!(h.is_released());
        assert!(!h.release());
        assert!(h.is_released());
    }

    #[test]
    fn handles_have_distinct_ids() {
        let a = handle();
        let b = handle();
        assert_ne!(a.id(), b.id());
        // Silence the drop warning in tests
        let (mut a, mut b) = (a, b);
        a.release();
        b.release();
    }

    #[test]
    fn label_describes_the_source() {
        let mut h = handle();
        assert_eq!(h.label(), "assets/chime.ogg");
        h.release();
    }
}
