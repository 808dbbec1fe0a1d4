//! # Playback Driver
//!
//! Drives one playback session at a time against the [`PlaybackDevice`]:
//! resets the device between cues, binds materialized sources, and runs
//! the play retry loop with linear backoff.
//!
//! The driver never decides *what* to play next; the controller owns the
//! queue and calls down here. It also never parks the shared state lock
//! across an await: every lock scope is synchronous and short.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use bridge_traits::error::BridgeError;
use bridge_traits::playback::{AudioSource, DeviceFailure, PlaybackDevice};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};

use crate::codec::ResourceCodec;
use crate::config::PlaybackConfig;
use crate::error::{PlaybackQueueError, Result};
use crate::handle::PlaybackHandle;
use crate::item::{clamp_volume, QueueItem};
use crate::state::PlaybackCoreState;

/// How a play retry loop ended, short of an outright error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The device accepted playback on the given attempt (1-based).
    Played {
        /// Attempt that succeeded.
        attempt: u32,
    },
    /// Every attempt was refused by autoplay policy while audio is still
    /// locked. The session stays open, waiting on an unlock gesture.
    Blocked,
    /// The session epoch went stale before an attempt could run. The
    /// loop abandoned itself without touching the device again.
    Superseded,
}

/// Executes playback sessions against the device.
pub struct PlaybackDriver {
    device: Arc<dyn PlaybackDevice>,
    state: Arc<Mutex<PlaybackCoreState>>,
    codec: ResourceCodec,
    events: EventBus,
    config: PlaybackConfig,
}

impl PlaybackDriver {
    /// Creates a driver over a device and the shared core state.
    pub fn new(
        device: Arc<dyn PlaybackDevice>,
        state: Arc<Mutex<PlaybackCoreState>>,
        events: EventBus,
        config: PlaybackConfig,
    ) -> Self {
        let codec = ResourceCodec::new(&config);
        Self {
            device,
            state,
            codec,
            events,
            config,
        }
    }

    /// Resets the device ahead of a new cue.
    ///
    /// Pauses, rewinds, releases the previous handle, and yields once so
    /// queued device callbacks observe the reset before the next bind.
    /// Pause and seek are best effort: a device mid-hiccup still gets the
    /// next load.
    pub async fn prepare(&self) {
        if let Err(err) = self.device.pause().await {
            tracing::warn!(error = %err, "Prepare: pause failed");
        }
        if let Err(err) = self.device.seek(Duration::ZERO).await {
            tracing::warn!(error = %err, "Prepare: rewind failed");
        }

        let released = self.state.lock().release_current();
        if released {
            tracing::debug!("Released previous playback handle");
        }

        tokio::task::yield_now().await;
    }

    /// Materializes and binds a cue, returning its diagnostic label.
    ///
    /// Applies the cue's volume clamped into `[0, 1]`, hands the source to
    /// the device for buffering, and installs the new live handle. Returns
    /// `None` without binding when `epoch` went stale while the device
    /// calls were in flight: a force-clear that ran meanwhile already
    /// owns the device, and binding now would leak a handle past it.
    ///
    /// # Errors
    ///
    /// [`PlaybackQueueError::Decode`] when an inline payload is invalid,
    /// [`PlaybackQueueError::UnsupportedKind`] when the device refuses the
    /// source kind, [`PlaybackQueueError::Device`] for other bridge
    /// failures.
    pub async fn load(&self, item: &QueueItem, epoch: u64) -> Result<Option<String>> {
        let source = self.codec.materialize(&item.source).await?;
        let label = source.label();
        let volume = clamp_volume(item.volume);

        self.device.set_volume(volume).await?;

        match self.device.load(source.clone()).await {
            Ok(()) => {}
            Err(BridgeError::Playback(DeviceFailure::SourceUnsupported)) => {
                return Err(PlaybackQueueError::UnsupportedKind(label));
            }
            Err(err) => return Err(err.into()),
        }

        {
            let mut state = self.state.lock();
            if !state.is_session_current(epoch) {
                tracing::debug!(label = %label, "Session cleared during load, source not bound");
                return Ok(None);
            }
            if let Some(previous) = state.bind_handle(PlaybackHandle::new(source)) {
                tracing::debug!(superseded = %previous.label(), "Displaced live handle during load");
            }
        }
        tracing::debug!(label = %label, volume, "Source bound, buffering requested");

        Ok(Some(label))
    }

    /// Runs the play retry loop for the currently bound source.
    ///
    /// Attempt `n` failing schedules attempt `n + 1` after `n` times the
    /// base delay. Before every attempt, including the first, the loop
    /// checks that `epoch` is still the live session and abandons itself
    /// otherwise; a force-clear landing anywhere between the drain and
    /// the last backoff sleep therefore keeps the device untouched.
    ///
    /// On the final attempt an autoplay refusal while audio is locked
    /// yields [`PlayOutcome::Blocked`] instead of an error.
    ///
    /// # Errors
    ///
    /// [`PlaybackQueueError::Playback`] when the budget is exhausted by
    /// anything other than a pre-unlock autoplay refusal.
    pub async fn play_with_retry(&self, label: &str, epoch: u64) -> Result<PlayOutcome> {
        let mut attempt: u32 = 1;
        loop {
            if !self.state.lock().is_session_current(epoch) {
                tracing::debug!(label, attempt, "Session superseded, skipping play attempt");
                return Ok(PlayOutcome::Superseded);
            }

            match self.device.play().await {
                Ok(()) => {
                    tracing::debug!(label, attempt, "Play attempt succeeded");
                    return Ok(PlayOutcome::Played { attempt });
                }
                Err(err) => {
                    if attempt >= self.config.retry_limit {
                        let unlocked = self.state.lock().is_unlocked();
                        if err.is_autoplay_block() && !unlocked {
                            tracing::info!(label, "Playback blocked pending unlock gesture");
                            return Ok(PlayOutcome::Blocked);
                        }
                        return Err(PlaybackQueueError::Playback {
                            attempts: attempt,
                            failure: device_failure(err),
                        });
                    }

                    let delay = self.config.retry_delay(attempt);
                    let delay_ms = delay.as_millis() as u64;
                    tracing::warn!(
                        label,
                        attempt,
                        delay_ms,
                        error = %err,
                        "Play attempt failed, retrying"
                    );
                    self.events
                        .emit(CoreEvent::Playback(PlaybackEvent::RetryScheduled {
                            attempt,
                            delay_ms,
                        }))
                        .ok();

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Plays a silent ping to convert a user gesture into an unlock.
    ///
    /// Mutes the device, plays and immediately rewinds the configured ping
    /// source, unmutes, then rebinds the interrupted source so a blocked
    /// session can replay it. Every step is allowed to fail; the gesture
    /// counts regardless. Returns the first failure, if any, for
    /// diagnostics.
    pub async fn unlock_ping(&self) -> Option<String> {
        let source = AudioSource::LocalFile {
            path: self.config.unlock_ping_source.clone(),
        };

        let mut failure: Option<String> = None;
        let mut record = |step: &'static str, err: BridgeError| {
            tracing::debug!(step, error = %err, "Unlock ping step failed");
            if failure.is_none() {
                failure = Some(format!("{}: {}", step, err));
            }
        };

        if let Err(err) = self.device.set_muted(true).await {
            record("mute", err);
        }
        if let Err(err) = self.device.load(source).await {
            record("load", err);
        }
        if let Err(err) = self.device.play().await {
            record("play", err);
        }
        if let Err(err) = self.device.pause().await {
            record("pause", err);
        }
        if let Err(err) = self.device.seek(Duration::ZERO).await {
            record("rewind", err);
        }
        if let Err(err) = self.device.set_muted(false).await {
            record("unmute", err);
        }

        // The ping displaced whatever the live session had bound
        let interrupted = self
            .state
            .lock()
            .current_handle()
            .map(|handle| handle.source().clone());
        if let Some(source) = interrupted {
            if let Err(err) = self.device.load(source).await {
                record("rebind", err);
            }
        }

        failure
    }

    /// Stops and rewinds the device, swallowing failures.
    ///
    /// Used by force-clear, which must always run to completion.
    pub async fn halt(&self) {
        if let Err(err) = self.device.pause().await {
            tracing::warn!(error = %err, "Halt: pause failed");
        }
        if let Err(err) = self.device.seek(Duration::ZERO).await {
            tracing::warn!(error = %err, "Halt: rewind failed");
        }
    }

    /// Logs the device's view of a reported failure.
    ///
    /// Captures the bound source, error code, buffering state, and
    /// readiness state alongside the failure reason.
    pub async fn log_device_failure(&self, failure: &DeviceFailure) {
        let diagnostics = self.device.diagnostics().await;
        tracing::warn!(
            failure = failure.as_str(),
            source = diagnostics.source.as_deref().unwrap_or("<none>"),
            error_code = ?diagnostics.error_code,
            buffering = diagnostics.buffering.as_str(),
            readiness = diagnostics.readiness.as_str(),
            "Playback device reported failure"
        );
    }

    /// The device this driver runs against.
    pub fn device(&self) -> &Arc<dyn PlaybackDevice> {
        &self.device
    }
}

fn device_failure(err: BridgeError) -> DeviceFailure {
    match err {
        BridgeError::Playback(failure) => failure,
        other => DeviceFailure::Other {
            detail: other.to_string(),
        },
    }
}
