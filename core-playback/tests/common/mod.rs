//! Shared scripted doubles for the integration suites.
//!
//! The device mock records every call it receives, in order, and can be
//! told to refuse playback a fixed number of times, stay autoplay-blocked
//! until released, or report itself unavailable. A single load or play
//! call can also be held open on a gate to park the pipeline mid-flight.
//! Lifecycle events are pushed through the same broadcast channel a real
//! host would use.

// Each suite uses its own subset of these helpers
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, Notify};

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::playback::{
    AudioSource, DeviceDiagnostics, DeviceEvent, DeviceFailure, PlaybackDevice,
};
use bridge_traits::presentation::CaptionPresenter;
use bridge_traits::unlock::{UnlockNotifier, UnlockPrompt};
use core_runtime::events::{CoreEvent, EventStream};

// ============================================================================
// Mock PlaybackDevice
// ============================================================================

struct DeviceState {
    available: bool,
    blocked: bool,
    play_failures_left: u32,
    play_failure: DeviceFailure,
    load_failure: Option<DeviceFailure>,
    pause_failure: Option<DeviceFailure>,
    load_gate: Option<Arc<Notify>>,
    play_gate: Option<Arc<Notify>>,
    ops: Vec<String>,
    volumes: Vec<f32>,
    loads: Vec<AudioSource>,
    diagnostics: DeviceDiagnostics,
}

pub struct MockPlaybackDevice {
    state: Mutex<DeviceState>,
    events: broadcast::Sender<DeviceEvent>,
}

impl MockPlaybackDevice {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(DeviceState {
                available: true,
                blocked: false,
                play_failures_left: 0,
                play_failure: DeviceFailure::Network,
                load_failure: None,
                pause_failure: None,
                load_gate: None,
                play_gate: None,
                ops: Vec::new(),
                volumes: Vec::new(),
                loads: Vec::new(),
                diagnostics: DeviceDiagnostics::default(),
            }),
            events,
        }
    }

    /// Fail the next `count` play calls with the given failure.
    pub fn with_play_failures(self, count: u32, failure: DeviceFailure) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.play_failures_left = count;
            state.play_failure = failure;
        }
        self
    }

    /// Refuse every play with `AutoplayBlocked` until released.
    pub fn with_autoplay_blocked(self) -> Self {
        self.state.lock().unwrap().blocked = true;
        self
    }

    /// Fail every load with the given failure.
    pub fn with_load_failure(self, failure: DeviceFailure) -> Self {
        self.state.lock().unwrap().load_failure = Some(failure);
        self
    }

    /// Fail every pause with the given failure.
    pub fn with_pause_failure(self, failure: DeviceFailure) -> Self {
        self.state.lock().unwrap().pause_failure = Some(failure);
        self
    }

    /// Report the device as unusable.
    pub fn with_unavailable(self) -> Self {
        self.state.lock().unwrap().available = false;
        self
    }

    /// Snapshot reported by `diagnostics`.
    pub fn with_diagnostics(self, diagnostics: DeviceDiagnostics) -> Self {
        self.state.lock().unwrap().diagnostics = diagnostics;
        self
    }

    /// Release or reinstate the autoplay block.
    pub fn set_blocked(&self, blocked: bool) {
        self.state.lock().unwrap().blocked = blocked;
    }

    /// Hold the next load open until the returned gate fires.
    ///
    /// The op is recorded on arrival; only the call's completion waits.
    pub fn gate_next_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().load_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Hold the next play open until the returned gate fires.
    pub fn gate_next_play(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().play_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Push a lifecycle event as the host would.
    pub fn emit(&self, event: DeviceEvent) {
        self.events.send(event).ok();
    }

    /// Every device call in arrival order, e.g. `["pause", "seek", ...]`.
    pub fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn play_count(&self) -> u32 {
        self.count_op("play")
    }

    pub fn pause_count(&self) -> u32 {
        self.count_op("pause")
    }

    pub fn seek_count(&self) -> u32 {
        self.count_op("seek")
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.state.lock().unwrap().volumes.clone()
    }

    pub fn loads(&self) -> Vec<AudioSource> {
        self.state.lock().unwrap().loads.clone()
    }

    pub fn loaded_labels(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .loads
            .iter()
            .map(|source| source.label())
            .collect()
    }

    fn count_op(&self, op: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|recorded| recorded.as_str() == op)
            .count() as u32
    }
}

#[async_trait::async_trait]
impl PlaybackDevice for MockPlaybackDevice {
    async fn load(&self, source: AudioSource) -> Result<()> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.ops.push(format!("load:{}", source.label()));
            state.loads.push(source);
            state.load_gate.take()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match &self.state.lock().unwrap().load_failure {
            Some(failure) => Err(BridgeError::Playback(failure.clone())),
            None => Ok(()),
        }
    }

    async fn play(&self) -> Result<()> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.ops.push("play".to_string());
            state.play_gate.take()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut state = self.state.lock().unwrap();
        if state.blocked {
            return Err(BridgeError::Playback(DeviceFailure::AutoplayBlocked));
        }
        if state.play_failures_left > 0 {
            state.play_failures_left -= 1;
            return Err(BridgeError::Playback(state.play_failure.clone()));
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push("pause".to_string());
        match &state.pause_failure {
            Some(failure) => Err(BridgeError::Playback(failure.clone())),
            None => Ok(()),
        }
    }

    async fn seek(&self, _position: Duration) -> Result<()> {
        self.state.lock().unwrap().ops.push("seek".to_string());
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("volume:{}", volume));
        state.volumes.push(volume);
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .ops
            .push(format!("mute:{}", muted));
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    async fn diagnostics(&self) -> DeviceDiagnostics {
        self.state.lock().unwrap().diagnostics.clone()
    }

    fn is_available(&self) -> bool {
        self.state.lock().unwrap().available
    }
}

// ============================================================================
// Mock CaptionPresenter
// ============================================================================

#[derive(Default)]
pub struct MockCaptionPresenter {
    shown: Mutex<u32>,
    hidden: Mutex<u32>,
}

impl MockCaptionPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown_count(&self) -> u32 {
        *self.shown.lock().unwrap()
    }

    pub fn hidden_count(&self) -> u32 {
        *self.hidden.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl CaptionPresenter for MockCaptionPresenter {
    async fn show_caption(&self) -> Result<()> {
        *self.shown.lock().unwrap() += 1;
        Ok(())
    }

    async fn hide_caption(&self) -> Result<()> {
        *self.hidden.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// Mock UnlockPrompt
// ============================================================================

/// Prompt double standing in for the host's gesture surface.
///
/// The granting variant releases the device's autoplay block when
/// presented, the way a real tap would. The gated variant additionally
/// holds the prompt open until the test fires the returned [`Notify`].
pub struct MockUnlockPrompt {
    device: Option<Arc<MockPlaybackDevice>>,
    gate: Option<Arc<Notify>>,
    fail: bool,
    presents: Mutex<u32>,
}

impl MockUnlockPrompt {
    pub fn granting(device: Arc<MockPlaybackDevice>) -> Self {
        Self {
            device: Some(device),
            gate: None,
            fail: false,
            presents: Mutex::new(0),
        }
    }

    pub fn gated(device: Arc<MockPlaybackDevice>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let prompt = Self {
            device: Some(device),
            gate: Some(Arc::clone(&gate)),
            fail: false,
            presents: Mutex::new(0),
        };
        (prompt, gate)
    }

    pub fn failing() -> Self {
        Self {
            device: None,
            gate: None,
            fail: true,
            presents: Mutex::new(0),
        }
    }

    pub fn present_count(&self) -> u32 {
        *self.presents.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl UnlockPrompt for MockUnlockPrompt {
    async fn present(&self) -> Result<()> {
        *self.presents.lock().unwrap() += 1;
        if self.fail {
            return Err(BridgeError::OperationFailed(
                "prompt surface rejected".to_string(),
            ));
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(device) = &self.device {
            device.set_blocked(false);
        }
        Ok(())
    }
}

// ============================================================================
// Mock UnlockNotifier
// ============================================================================

#[derive(Default)]
pub struct MockUnlockNotifier {
    notified: Mutex<u32>,
}

impl MockUnlockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notified_count(&self) -> u32 {
        *self.notified.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl UnlockNotifier for MockUnlockNotifier {
    async fn notify_unlock_complete(&self) -> Result<()> {
        *self.notified.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Let spawned drains and event reactions run to completion.
pub async fn settle() {
    settle_for(50).await;
}

/// Wait long enough for backoff sleeps of the given length to elapse.
pub async fn settle_for(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Pull every event currently buffered on the stream.
pub fn drain_events(stream: &mut EventStream) -> Vec<CoreEvent> {
    let mut events = Vec::new();
    while let Some(Ok(event)) = stream.try_recv() {
        events.push(event);
    }
    events
}
