//! # Queue Controller
//!
//! Owns the pending-cue store and orchestrates the whole pipeline: inbound
//! commands are validated and enqueued, the head cue is drained into a
//! playback session, device events advance or tear the session down, and
//! every per-cue error is contained right here.
//!
//! ## Architecture
//!
//! ```text
//! Command ──> QueueController ──> QueueStore (pending cues)
//!                   │
//!                   ├──> PlaybackDriver ──> PlaybackDevice
//!                   │          ▲
//!                   │          └── DeviceEvent channel ──> event loop
//!                   │
//!                   └──> UnlockCoordinator ──> UnlockPrompt / UnlockNotifier
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::controller::QueueController;
//! use core_playback::command::Command;
//!
//! let controller = QueueController::builder()
//!     .with_device(device)
//!     .build()?;
//! controller.start();
//!
//! controller
//!     .handle_command(Command::EnqueueFile {
//!         path: "chime.ogg".to_string(),
//!         volume: Some(0.8),
//!         priority: None,
//!     })
//!     .await;
//! ```
//!
//! ## Error Containment
//!
//! No per-cue failure escapes the controller. Every error path ends the
//! same way: log, release the handle, clear busy, hide the caption, and
//! schedule the next drain after a short recovery delay.

use std::mem;
use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use bridge_traits::playback::{DeviceEvent, PlaybackDevice};
use bridge_traits::presentation::{CaptionPresenter, NoopCaptionPresenter};
use bridge_traits::unlock::{NoopUnlockNotifier, NoopUnlockPrompt, UnlockNotifier, UnlockPrompt};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, QueueEvent, RecvError};

use crate::command::{Command, CommandOutcome};
use crate::config::PlaybackConfig;
use crate::driver::{PlayOutcome, PlaybackDriver};
use crate::error::{PlaybackQueueError, Result};
use crate::item::{CueSource, QueueItem};
use crate::state::PlaybackCoreState;
use crate::store::{InsertOutcome, QueueStore};
use crate::unlock::{UnlockCallback, UnlockCoordinator, UnlockOutcome};

/// Point-in-time view of the queue core, for hosts and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoreStatus {
    /// Number of pending cues.
    pub queue_length: usize,
    /// A playback session is in progress.
    pub busy: bool,
    /// A source is currently bound to the device.
    pub has_live_handle: bool,
    /// Autonomous playback has been unlocked.
    pub unlocked: bool,
    /// The playback device reports itself usable.
    pub device_available: bool,
}

struct Inner {
    driver: Arc<PlaybackDriver>,
    unlock: UnlockCoordinator,
    presenter: Arc<dyn CaptionPresenter>,
    state: Arc<Mutex<PlaybackCoreState>>,
    store: Mutex<QueueStore>,
    events: EventBus,
    config: PlaybackConfig,
    shutdown: CancellationToken,
    // Regenerated on force-clear so pending recovery drains die with it
    drain_timers: Mutex<CancellationToken>,
}

/// Single-consumer playback queue over one audio device.
///
/// Cheap to clone; clones share the same queue and state.
#[derive(Clone)]
pub struct QueueController {
    inner: Arc<Inner>,
}

impl QueueController {
    /// Starts assembling a controller.
    pub fn builder() -> QueueControllerBuilder {
        QueueControllerBuilder::default()
    }

    /// Spawns the device event loop.
    ///
    /// The loop consumes device events until [`QueueController::shutdown`]
    /// is called or the device drops its event channel.
    pub fn start(&self) -> JoinHandle<()> {
        let controller = self.clone();
        let mut receiver = self.inner.driver.device().subscribe_events();
        let shutdown = self.inner.shutdown.clone();
        tokio::spawn(async move {
            tracing::debug!("Device event loop started");
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = receiver.recv() => match event {
                        Ok(event) => controller.handle_device_event(event).await,
                        Err(RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Device event stream lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("Device event loop stopped");
        })
    }

    /// Stops the event loop and cancels every scheduled drain.
    pub fn shutdown(&self) {
        tracing::debug!("Queue controller shutting down");
        self.inner.shutdown.cancel();
    }

    /// The event bus carrying queue, playback, and unlock events.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// The active configuration.
    pub fn config(&self) -> &PlaybackConfig {
        &self.inner.config
    }

    /// Current queue and session state.
    pub fn status(&self) -> CoreStatus {
        let snapshot = self.inner.state.lock().snapshot();
        let store = self.inner.store.lock().status();
        CoreStatus {
            queue_length: store.length,
            busy: snapshot.busy,
            has_live_handle: snapshot.has_live_handle,
            unlocked: snapshot.unlocked,
            device_available: self.inner.driver.device().is_available(),
        }
    }

    /// Dispatches one inbound command.
    pub async fn handle_command(&self, command: Command) -> CommandOutcome {
        tracing::debug!(command = command.describe(), "Handling command");
        match command {
            Command::EnqueueFile {
                path,
                volume,
                priority,
            } => {
                let mut item = QueueItem::local_file(path);
                if let Some(volume) = volume {
                    item = item.with_volume(volume);
                }
                if let Some(priority) = priority {
                    item = item.with_priority(priority);
                }
                CommandOutcome::Enqueued {
                    accepted: self.enqueue(item),
                }
            }
            Command::EnqueueEncoded {
                payload,
                mime,
                volume,
                priority,
            } => {
                let mut item = QueueItem::inline_encoded(payload);
                if let Some(mime) = mime {
                    item = item.with_mime(mime);
                }
                if let Some(volume) = volume {
                    item = item.with_volume(volume);
                }
                if let Some(priority) = priority {
                    item = item.with_priority(priority);
                }
                CommandOutcome::Enqueued {
                    accepted: self.enqueue(item),
                }
            }
            Command::Stop | Command::ClearAll => {
                self.force_clear().await;
                CommandOutcome::Cleared
            }
            Command::RequestUnlock => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller.request_unlock().await;
                });
                CommandOutcome::UnlockRequested
            }
        }
    }

    /// Validates and enqueues a cue, then kicks off a drain.
    ///
    /// Returns `false` without touching the store when the cue fails
    /// validation or the store refuses it.
    pub fn enqueue(&self, item: QueueItem) -> bool {
        if let Err(err) = item.validate() {
            tracing::warn!(error = %err, "Rejected invalid cue");
            self.inner
                .events
                .emit(CoreEvent::Queue(QueueEvent::ItemRejected {
                    reason: err.to_string(),
                }))
                .ok();
            return false;
        }

        let kind = item.kind();
        let priority = item.priority;
        let (outcome, queue_length) = {
            let mut store = self.inner.store.lock();
            let outcome = store.insert(item);
            (outcome, store.len())
        };

        match outcome {
            InsertOutcome::Rejected => {
                tracing::warn!("Cue refused, queue capacity is zero");
                self.inner
                    .events
                    .emit(CoreEvent::Queue(QueueEvent::ItemRejected {
                        reason: "queue capacity is zero".to_string(),
                    }))
                    .ok();
                false
            }
            InsertOutcome::Inserted { evicted } => {
                if let Some(evicted) = evicted {
                    let age_ms = (Utc::now() - evicted.enqueued_at).num_milliseconds();
                    tracing::warn!(
                        kind = evicted.kind().as_str(),
                        priority = evicted.priority,
                        age_ms,
                        "Evicted oldest pending cue"
                    );
                    self.inner
                        .events
                        .emit(CoreEvent::Queue(QueueEvent::ItemEvicted {
                            kind: evicted.kind().as_str().to_string(),
                            priority: evicted.priority,
                        }))
                        .ok();
                }

                tracing::debug!(kind = kind.as_str(), priority, queue_length, "Cue enqueued");
                self.inner
                    .events
                    .emit(CoreEvent::Queue(QueueEvent::ItemEnqueued {
                        kind: kind.as_str().to_string(),
                        priority,
                        queue_length,
                    }))
                    .ok();

                self.spawn_drain();
                true
            }
        }
    }

    /// Attempts to start a playback session for the head cue.
    ///
    /// No-op when a session is busy, the store is empty, or the device is
    /// unavailable. Errors never escape: they are logged, the session torn
    /// down, and a recovery drain scheduled.
    pub async fn drain_next(&self) {
        if !self.inner.driver.device().is_available() {
            tracing::debug!("Drain skipped, playback device unavailable");
            return;
        }

        let Some(epoch) = self.inner.state.lock().try_begin_session() else {
            tracing::trace!("Drain skipped, session busy");
            return;
        };

        let Some(item) = self.inner.store.lock().remove_head() else {
            self.inner.state.lock().end_session();
            return;
        };

        let label = item_label(&item);
        tracing::debug!(
            kind = item.kind().as_str(),
            priority = item.priority,
            epoch,
            "Draining next cue"
        );

        if let Err(err) = self.run_session(&item, &label, epoch).await {
            self.contain_session_error(&label, err, epoch).await;
        }
    }

    /// Stops everything: pending cues, the live session, scheduled drains.
    ///
    /// Safe to call at any time, including when already idle and empty.
    pub async fn force_clear(&self) {
        let stale = {
            let mut timers = self.inner.drain_timers.lock();
            mem::replace(&mut *timers, self.inner.shutdown.child_token())
        };
        stale.cancel();

        let dropped = self.inner.store.lock().clear();
        {
            let mut state = self.inner.state.lock();
            state.release_current();
            state.end_session();
            state.invalidate_sessions();
        }

        self.inner.driver.halt().await;
        if let Err(err) = self.inner.presenter.hide_caption().await {
            tracing::debug!(error = %err, "Caption hide failed");
        }

        self.inner
            .events
            .emit(CoreEvent::Queue(QueueEvent::Cleared {
                dropped: dropped.len(),
            }))
            .ok();
        tracing::info!(dropped = dropped.len(), "Queue force-cleared");
    }

    /// Requests an audio unlock without queueing anything.
    pub async fn request_unlock(&self) -> UnlockOutcome {
        self.inner.unlock.request_unlock(None).await
    }

    // ========================================================================
    // Session internals
    // ========================================================================

    async fn run_session(&self, item: &QueueItem, fallback_label: &str, epoch: u64) -> Result<()> {
        self.inner.driver.prepare().await;
        let Some(label) = self.inner.driver.load(item, epoch).await? else {
            tracing::debug!(label = %fallback_label, "Session cleared during load");
            return Ok(());
        };

        match self.inner.driver.play_with_retry(&label, epoch).await? {
            PlayOutcome::Played { attempt } => {
                if !self.inner.state.lock().is_session_current(epoch) {
                    self.stop_stale_playback(&label).await;
                    return Ok(());
                }
                tracing::debug!(label = %label, attempt, "Cue playing, session stays busy until it ends");
                Ok(())
            }
            PlayOutcome::Superseded => {
                tracing::debug!(label = %fallback_label, "Session cleared before playback");
                Ok(())
            }
            PlayOutcome::Blocked => {
                self.defer_to_unlock(label, epoch);
                Ok(())
            }
        }
    }

    /// Stops playback that outlived its session.
    ///
    /// A force-clear landing while the winning play call was in flight
    /// tears the session state down but cannot see the playback that is
    /// about to start; stop the device again once the call resolves,
    /// unless a newer session has taken the device over since.
    async fn stop_stale_playback(&self, label: &str) {
        {
            let mut state = self.inner.state.lock();
            if state.is_busy() {
                return;
            }
            state.release_current();
        }
        tracing::debug!(label, "Stopping playback that outlived its session");
        self.inner.driver.halt().await;
    }

    /// Parks a blocked session on the unlock coordinator.
    ///
    /// The session keeps the busy flag; once the gesture lands, the bound
    /// source is replayed with a fresh retry budget.
    fn defer_to_unlock(&self, label: String, epoch: u64) {
        tracing::info!(label = %label, "Deferring session until audio unlock");
        let controller = self.clone();
        tokio::spawn(async move {
            let replay: UnlockCallback = {
                let controller = controller.clone();
                let label = label.clone();
                Box::new(move || -> BoxFuture<'static, ()> {
                    Box::pin(async move {
                        controller.replay_blocked(&label, epoch).await;
                    })
                })
            };

            let outcome = controller.inner.unlock.request_unlock(Some(replay)).await;
            if outcome == UnlockOutcome::PromptFailed {
                controller
                    .contain_session_error(&label, PlaybackQueueError::PlaybackBlocked, epoch)
                    .await;
            }
        });
    }

    async fn replay_blocked(&self, label: &str, epoch: u64) {
        if !self.inner.state.lock().is_session_current(epoch) {
            tracing::debug!(label, "Blocked session superseded before unlock, skipping replay");
            return;
        }

        tracing::info!(label, "Replaying blocked session after unlock");
        match self.inner.driver.play_with_retry(label, epoch).await {
            Ok(PlayOutcome::Played { attempt }) => {
                if !self.inner.state.lock().is_session_current(epoch) {
                    self.stop_stale_playback(label).await;
                    return;
                }
                tracing::debug!(label, attempt, "Blocked session now playing");
            }
            Ok(PlayOutcome::Superseded) => {}
            Ok(PlayOutcome::Blocked) => {
                self.contain_session_error(label, PlaybackQueueError::PlaybackBlocked, epoch)
                    .await;
            }
            Err(err) => self.contain_session_error(label, err, epoch).await,
        }
    }

    /// The single error sink for failed sessions.
    async fn contain_session_error(&self, label: &str, err: PlaybackQueueError, epoch: u64) {
        if let PlaybackQueueError::Playback { failure, .. } = &err {
            self.inner.driver.log_device_failure(failure).await;
        }

        {
            let mut state = self.inner.state.lock();
            if !state.is_session_current(epoch) {
                tracing::debug!(label, "Aborted session was already superseded");
                return;
            }
            state.release_current();
            state.end_session();
        }

        tracing::warn!(label, error = %err, "Playback session aborted");

        if let Err(hide_err) = self.inner.presenter.hide_caption().await {
            tracing::debug!(error = %hide_err, "Caption hide failed");
        }

        let attempts = match &err {
            PlaybackQueueError::Playback { attempts, .. } => *attempts,
            _ => 0,
        };
        self.inner
            .events
            .emit(CoreEvent::Playback(PlaybackEvent::SessionFailed {
                label: label.to_string(),
                reason: err.reason().to_string(),
                attempts,
            }))
            .ok();

        self.schedule_recovery_drain();
    }

    // ========================================================================
    // Device event reactions
    // ========================================================================

    async fn handle_device_event(&self, event: DeviceEvent) {
        match event {
            DeviceEvent::Started => {
                let (label, prompt_pending) = {
                    let state = self.inner.state.lock();
                    (
                        state.current_handle().map(|handle| handle.label()),
                        state.is_prompt_pending(),
                    )
                };
                if prompt_pending {
                    tracing::debug!("Ignoring device start during unlock ping");
                    return;
                }
                let Some(label) = label else {
                    tracing::debug!("Device start with no live handle");
                    return;
                };

                tracing::info!(label = %label, "Playback started");
                if let Err(err) = self.inner.presenter.show_caption().await {
                    tracing::debug!(error = %err, "Caption show failed");
                }
                self.inner
                    .events
                    .emit(CoreEvent::Playback(PlaybackEvent::SessionStarted { label }))
                    .ok();
            }
            DeviceEvent::Ended => {
                let (label, prompt_pending) = {
                    let mut state = self.inner.state.lock();
                    if state.is_prompt_pending() {
                        (None, true)
                    } else {
                        let label = state.current_handle().map(|handle| handle.label());
                        state.release_current();
                        state.end_session();
                        (label, false)
                    }
                };
                if prompt_pending {
                    tracing::debug!("Ignoring device end during unlock ping");
                    return;
                }

                if let Err(err) = self.inner.presenter.hide_caption().await {
                    tracing::debug!(error = %err, "Caption hide failed");
                }
                if let Some(label) = label {
                    tracing::info!(label = %label, "Playback completed");
                    self.inner
                        .events
                        .emit(CoreEvent::Playback(PlaybackEvent::SessionCompleted { label }))
                        .ok();
                }

                self.drain_next().await;
            }
            DeviceEvent::Failed { failure } => {
                if self.inner.state.lock().is_prompt_pending() {
                    tracing::debug!(
                        failure = failure.as_str(),
                        "Ignoring device failure during unlock ping"
                    );
                    return;
                }
                self.inner.driver.log_device_failure(&failure).await;

                let label = {
                    let mut state = self.inner.state.lock();
                    let label = state.current_handle().map(|handle| handle.label());
                    state.release_current();
                    state.end_session();
                    state.invalidate_sessions();
                    label
                };

                if let Err(err) = self.inner.presenter.hide_caption().await {
                    tracing::debug!(error = %err, "Caption hide failed");
                }
                self.inner
                    .events
                    .emit(CoreEvent::Playback(PlaybackEvent::SessionFailed {
                        label: label.unwrap_or_else(|| "<unbound>".to_string()),
                        reason: failure.as_str().to_string(),
                        attempts: 0,
                    }))
                    .ok();

                self.schedule_recovery_drain();
            }
        }
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    fn spawn_drain(&self) {
        let controller = self.clone();
        tokio::spawn(async move {
            controller.drain_next().await;
        });
    }

    /// Schedules a drain after the recovery delay.
    ///
    /// The delay keeps a systematically failing head cue from spinning the
    /// queue in a tight loop. Force-clear cancels anything scheduled here.
    fn schedule_recovery_drain(&self) {
        let token = self.inner.drain_timers.lock().child_token();
        let delay = self.inner.config.recovery_drain_delay;
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Scheduled drain cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    controller.drain_next().await;
                }
            }
        });
    }
}

fn item_label(item: &QueueItem) -> String {
    match &item.source {
        CueSource::LocalFile { path } => path.clone(),
        CueSource::InlineEncoded { payload, mime } => {
            format!("inline {} ({} chars)", mime, payload.len())
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`QueueController`] with fail-fast validation.
///
/// The playback device is the one required collaborator. Presentation and
/// unlock surfaces default to no-ops so headless hosts work out of the
/// box.
#[derive(Default)]
pub struct QueueControllerBuilder {
    device: Option<Arc<dyn PlaybackDevice>>,
    presenter: Option<Arc<dyn CaptionPresenter>>,
    prompt: Option<Arc<dyn UnlockPrompt>>,
    notifier: Option<Arc<dyn UnlockNotifier>>,
    event_bus: Option<EventBus>,
    config: PlaybackConfig,
}

impl QueueControllerBuilder {
    /// Sets the playback device (required).
    pub fn with_device(mut self, device: Arc<dyn PlaybackDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Sets the caption surface.
    pub fn with_presenter(mut self, presenter: Arc<dyn CaptionPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Sets the unlock prompt surface.
    pub fn with_prompt(mut self, prompt: Arc<dyn UnlockPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Sets the unlock completion notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn UnlockNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Uses an existing event bus instead of creating one.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Sets the queue configuration.
    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates and assembles the controller.
    ///
    /// # Errors
    ///
    /// [`PlaybackQueueError::Config`] when the configuration is invalid or
    /// the playback device is missing.
    pub fn build(self) -> Result<QueueController> {
        self.config
            .validate()
            .map_err(PlaybackQueueError::Config)?;
        let device = self.device.ok_or_else(device_missing_error)?;

        let presenter = self
            .presenter
            .unwrap_or_else(|| Arc::new(NoopCaptionPresenter));
        let prompt = self.prompt.unwrap_or_else(|| Arc::new(NoopUnlockPrompt));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(NoopUnlockNotifier));
        let events = self
            .event_bus
            .unwrap_or_else(|| EventBus::new(self.config.event_buffer_size));

        let state = Arc::new(Mutex::new(PlaybackCoreState::new()));
        let driver = Arc::new(PlaybackDriver::new(
            Arc::clone(&device),
            Arc::clone(&state),
            events.clone(),
            self.config.clone(),
        ));
        let unlock = UnlockCoordinator::new(
            Arc::clone(&driver),
            Arc::clone(&state),
            prompt,
            notifier,
            events.clone(),
        );

        let shutdown = CancellationToken::new();
        let drain_timers = Mutex::new(shutdown.child_token());

        tracing::debug!(
            capacity = self.config.max_queue_size,
            retry_limit = self.config.retry_limit,
            "Queue controller assembled"
        );

        Ok(QueueController {
            inner: Arc::new(Inner {
                driver,
                unlock,
                presenter,
                state,
                store: Mutex::new(QueueStore::new(self.config.max_queue_size)),
                events,
                config: self.config,
                shutdown,
                drain_timers,
            }),
        })
    }
}

fn device_missing_error() -> PlaybackQueueError {
    PlaybackQueueError::Config(
        "PlaybackDevice implementation is required. \
         Inject your platform's audio output with with_device(): \
         web hosts wrap the media element, desktop hosts wrap their audio stack, \
         tests use a scripted mock."
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_device_fails_with_guidance() {
        let err = QueueController::builder().build().err().unwrap();
        match err {
            PlaybackQueueError::Config(message) => {
                assert!(message.contains("with_device"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = PlaybackConfig {
            retry_limit: 0,
            ..PlaybackConfig::default()
        };
        let err = QueueController::builder().with_config(config).build().err().unwrap();
        assert!(matches!(err, PlaybackQueueError::Config(_)));
    }
}
