//! # Core Playback State
//!
//! One owned struct holds every flag the queue machinery shares: the busy
//! flag that serializes sessions, the sticky unlock flag, the pending
//! prompt marker, the live device handle, and the session epoch.
//!
//! The controller guards a single instance behind a mutex and never holds
//! the lock across an await point. In-flight retry loops carry the epoch
//! they started with and abandon themselves once it goes stale.

use crate::handle::PlaybackHandle;

/// Point-in-time view of the shared flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSnapshot {
    /// A playback session is in progress.
    pub busy: bool,
    /// Autonomous playback has been unlocked.
    pub unlocked: bool,
    /// An unlock prompt is currently presented.
    pub prompt_pending: bool,
    /// A bound, unreleased device handle exists.
    pub has_live_handle: bool,
    /// Current session epoch.
    pub epoch: u64,
}

/// Shared state of the playback core.
#[derive(Debug, Default)]
pub struct PlaybackCoreState {
    busy: bool,
    unlocked: bool,
    prompt_pending: bool,
    current_handle: Option<PlaybackHandle>,
    epoch: u64,
}

impl PlaybackCoreState {
    /// Creates idle state: not busy, locked, no handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the busy flag for a new session.
    ///
    /// Returns the new session's epoch, or `None` when a session is
    /// already in progress. This is the only way the busy flag is set.
    pub fn try_begin_session(&mut self) -> Option<u64> {
        if self.busy {
            return None;
        }
        self.busy = true;
        self.epoch += 1;
        Some(self.epoch)
    }

    /// Clears the busy flag at the end of a session.
    pub fn end_session(&mut self) {
        self.busy = false;
    }

    /// Invalidates every in-flight session loop.
    ///
    /// Loops compare their starting epoch against the current one after
    /// each sleep and abandon themselves on mismatch.
    pub fn invalidate_sessions(&mut self) {
        self.epoch += 1;
    }

    /// Whether a loop started at `epoch` still owns the session.
    pub fn is_session_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    /// Whether a session is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Marks audio as unlocked. There is deliberately no way back.
    pub fn mark_unlocked(&mut self) {
        self.unlocked = true;
    }

    /// Whether autonomous playback is permitted.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Claims the unlock prompt.
    ///
    /// Returns `false` when a prompt is already pending, so at most one
    /// prompt is ever presented at a time.
    pub fn begin_prompt(&mut self) -> bool {
        if self.prompt_pending {
            return false;
        }
        self.prompt_pending = true;
        true
    }

    /// Marks the pending prompt as finished.
    pub fn end_prompt(&mut self) {
        self.prompt_pending = false;
    }

    /// Whether an unlock prompt is currently presented.
    pub fn is_prompt_pending(&self) -> bool {
        self.prompt_pending
    }

    /// Installs a freshly bound handle.
    ///
    /// A superseded predecessor is released on the spot and returned for
    /// diagnostics. `prepare` normally leaves the slot empty beforehand,
    /// so there usually is none.
    pub fn bind_handle(&mut self, handle: PlaybackHandle) -> Option<PlaybackHandle> {
        let mut previous = self.current_handle.replace(handle);
        if let Some(previous) = previous.as_mut() {
            previous.release();
        }
        previous
    }

    /// Releases and discards the current handle.
    ///
    /// Returns `true` if a live handle was actually released.
    pub fn release_current(&mut self) -> bool {
        match self.current_handle.take() {
            Some(mut handle) => handle.release(),
            None => false,
        }
    }

    /// The current handle, if one is bound.
    pub fn current_handle(&self) -> Option<&PlaybackHandle> {
        self.current_handle.as_ref()
    }

    /// Whether a bound, unreleased handle exists.
    pub fn has_live_handle(&self) -> bool {
        self.current_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_released())
    }

    /// Current session epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Copies the flags out for status reports and logging.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            busy: self.busy,
            unlocked: self.unlocked,
            prompt_pending: self.prompt_pending,
            has_live_handle: self.has_live_handle(),
            epoch: self.epoch,
        }
    }
}
