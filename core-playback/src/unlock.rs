//! # Unlock Coordinator
//!
//! Converts a user gesture into a persistent autoplay unlock.
//!
//! Hosts with autoplay restrictions refuse autonomous playback until the
//! user has interacted with the page or app. When a session exhausts its
//! retries against that refusal, the coordinator presents one unlock
//! prompt, plays a muted ping inside the resulting gesture, marks the core
//! unlocked for good, and hands control back to whoever was blocked.
//!
//! The prompt is single-flight: requests arriving while one is pending are
//! coalesced and the unlock flag never reverts once set.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

use bridge_traits::unlock::{UnlockNotifier, UnlockPrompt};
use core_runtime::events::{CoreEvent, EventBus, UnlockEvent};

use crate::driver::PlaybackDriver;
use crate::state::PlaybackCoreState;

/// Deferred work to run once the unlock is granted.
///
/// The controller uses this to replay a blocked session.
pub type UnlockCallback = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// How an unlock request resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Audio was already unlocked; any callback ran immediately.
    AlreadyUnlocked,
    /// Another request already has the prompt up. This request was
    /// coalesced into it and its callback dropped.
    Pending,
    /// The gesture arrived and the core is now unlocked.
    Granted,
    /// The host could not present the prompt. Audio stays locked.
    PromptFailed,
}

/// Runs the unlock flow against the host's prompt surface.
pub struct UnlockCoordinator {
    driver: Arc<PlaybackDriver>,
    state: Arc<Mutex<PlaybackCoreState>>,
    prompt: Arc<dyn UnlockPrompt>,
    notifier: Arc<dyn UnlockNotifier>,
    events: EventBus,
}

impl UnlockCoordinator {
    /// Creates a coordinator over the shared state and host surfaces.
    pub fn new(
        driver: Arc<PlaybackDriver>,
        state: Arc<Mutex<PlaybackCoreState>>,
        prompt: Arc<dyn UnlockPrompt>,
        notifier: Arc<dyn UnlockNotifier>,
        events: EventBus,
    ) -> Self {
        Self {
            driver,
            state,
            prompt,
            notifier,
            events,
        }
    }

    /// Requests an audio unlock, presenting the prompt if needed.
    ///
    /// Already-unlocked cores run `on_granted` immediately. A request that
    /// finds a prompt pending is coalesced: no second prompt, callback
    /// dropped. Otherwise the flow is: present prompt, await the gesture,
    /// play the muted ping (failures swallowed), mark unlocked, dismiss,
    /// notify the host, run `on_granted`.
    pub async fn request_unlock(&self, on_granted: Option<UnlockCallback>) -> UnlockOutcome {
        enum Claim {
            AlreadyUnlocked,
            Pending,
            Claimed,
        }

        let claim = {
            let mut state = self.state.lock();
            if state.is_unlocked() {
                Claim::AlreadyUnlocked
            } else if state.begin_prompt() {
                Claim::Claimed
            } else {
                Claim::Pending
            }
        };

        match claim {
            Claim::AlreadyUnlocked => {
                if let Some(callback) = on_granted {
                    callback().await;
                }
                return UnlockOutcome::AlreadyUnlocked;
            }
            Claim::Pending => {
                tracing::debug!("Unlock prompt already pending, request coalesced");
                return UnlockOutcome::Pending;
            }
            Claim::Claimed => {}
        }

        self.events
            .emit(CoreEvent::Unlock(UnlockEvent::PromptShown))
            .ok();
        tracing::info!("Presenting unlock prompt");

        if let Err(err) = self.prompt.present().await {
            tracing::warn!(error = %err, "Unlock prompt could not be presented");
            self.state.lock().end_prompt();
            return UnlockOutcome::PromptFailed;
        }

        if let Some(reason) = self.driver.unlock_ping().await {
            tracing::debug!(reason = %reason, "Unlock ping failed, unlocking anyway");
            self.events
                .emit(CoreEvent::Unlock(UnlockEvent::PingFailed { reason }))
                .ok();
        }

        {
            let mut state = self.state.lock();
            state.mark_unlocked();
            state.end_prompt();
        }
        self.events.emit(CoreEvent::Unlock(UnlockEvent::Unlocked)).ok();
        tracing::info!("Audio unlocked");

        if let Err(err) = self.prompt.dismiss().await {
            tracing::debug!(error = %err, "Unlock prompt dismissal failed");
        }
        if let Err(err) = self.notifier.notify_unlock_complete().await {
            tracing::debug!(error = %err, "Unlock completion notification failed");
        }

        if let Some(callback) = on_granted {
            callback().await;
        }

        UnlockOutcome::Granted
    }
}
