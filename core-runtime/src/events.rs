//! # Event Bus System
//!
//! Event-driven notification layer for the playback queue core, built on
//! `tokio::sync::broadcast`. Core components publish typed events; hosts and
//! diagnostics subscribe without coupling to core internals.
//!
//! ## Overview
//!
//! - **Event Types**: Strongly-typed enum hierarchies per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ Queue Ctrl   ├──────────────>│           │
//! └──────────────┘               │           │
//!                                │ EventBus  │
//! ┌──────────────┐     emit      │ (broadcast│     subscribe    ┌────────────┐
//! │ Playback Drv ├──────────────>│  channel) ├─────────────────>│ Subscriber │
//! └──────────────┘               │           │                  └────────────┘
//!                                │           │
//! ┌──────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │ Unlock Coord ├──────────────>│           ├─────────────────>│ Subscriber │
//! └──────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, QueueEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(64);
//! let mut subscriber = event_bus.subscribe();
//!
//! let event = CoreEvent::Queue(QueueEvent::ItemEnqueued {
//!     kind: "file".to_string(),
//!     priority: 5,
//!     queue_length: 1,
//! });
//! event_bus.emit(event).ok();
//!
//! let received = subscriber.recv().await.unwrap();
//! assert_eq!(received.description(), "Cue enqueued");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` produces two receive errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   the subscriber keeps receiving newer events.
//! - **`RecvError::Closed`**: all senders dropped; treat as shutdown.
//!
//! Emitting with zero subscribers returns an error from `emit`; callers that
//! publish opportunistically use `.ok()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Sized for bursts of per-attempt retry events on a full queue without
/// lagging a console subscriber.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the event type published and received through the event bus. It
/// wraps the domain-specific event types for the queue, the playback driver,
/// and the unlock coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Queue store changes
    Queue(QueueEvent),
    /// Playback session lifecycle
    Playback(PlaybackEvent),
    /// Autoplay unlock flow
    Unlock(UnlockEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Unlock(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::SessionFailed { .. }) => EventSeverity::Error,
            CoreEvent::Queue(QueueEvent::ItemRejected { .. }) => EventSeverity::Warning,
            CoreEvent::Unlock(UnlockEvent::PingFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::SessionStarted { .. }) => EventSeverity::Info,
            CoreEvent::Queue(QueueEvent::Cleared { .. }) => EventSeverity::Info,
            CoreEvent::Unlock(UnlockEvent::Unlocked) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Queue Events
// ============================================================================

/// Events emitted when the pending-cue store changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// A validated cue entered the store.
    ItemEnqueued {
        /// Cue kind ("file" or "encoded").
        kind: String,
        /// Drain priority of the cue.
        priority: i32,
        /// Store length after insertion.
        queue_length: usize,
    },
    /// An enqueue request failed validation and was dropped at the boundary.
    ItemRejected {
        /// Why the request was rejected.
        reason: String,
    },
    /// The oldest pending cue was evicted to make room in a full store.
    ItemEvicted {
        /// Cue kind of the evicted item.
        kind: String,
        /// Priority of the evicted item.
        priority: i32,
    },
    /// The store was force-cleared.
    Cleared {
        /// Number of pending cues dropped.
        dropped: usize,
    },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::ItemEnqueued { .. } => "Cue enqueued",
            QueueEvent::ItemRejected { .. } => "Cue rejected",
            QueueEvent::ItemEvicted { .. } => "Oldest cue evicted",
            QueueEvent::Cleared { .. } => "Queue cleared",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events covering one playback session from first play attempt to terminal
/// success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The device reported audible playback.
    SessionStarted {
        /// Diagnostic label of the playing source.
        label: String,
    },
    /// The source played to completion.
    SessionCompleted {
        /// Diagnostic label of the finished source.
        label: String,
    },
    /// A play attempt failed and a retry was scheduled.
    RetryScheduled {
        /// Attempt number that just failed (1-based).
        attempt: u32,
        /// Backoff delay before the next attempt, in milliseconds.
        delay_ms: u64,
    },
    /// The session aborted after exhausting its options.
    SessionFailed {
        /// Diagnostic label of the failed source.
        label: String,
        /// Failure classification.
        reason: String,
        /// Play attempts consumed.
        attempts: u32,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::SessionStarted { .. } => "Playback started",
            PlaybackEvent::SessionCompleted { .. } => "Playback completed",
            PlaybackEvent::RetryScheduled { .. } => "Play retry scheduled",
            PlaybackEvent::SessionFailed { .. } => "Playback session failed",
        }
    }
}

// ============================================================================
// Unlock Events
// ============================================================================

/// Events from the autoplay unlock flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum UnlockEvent {
    /// The unlock prompt was presented to the user.
    PromptShown,
    /// The unlock gesture completed; autonomous playback is permitted from
    /// now on.
    Unlocked,
    /// The silent unlock ping failed. Unlocking proceeded anyway.
    PingFailed {
        /// Why the ping failed.
        reason: String,
    },
}

impl UnlockEvent {
    fn description(&self) -> &str {
        match self {
            UnlockEvent::PromptShown => "Unlock prompt shown",
            UnlockEvent::Unlocked => "Audio unlocked",
            UnlockEvent::PingFailed { .. } => "Unlock ping failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` is the maximum number of events buffered per subscriber;
    /// a subscriber that falls further behind receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none. Core components publish opportunistically
    /// and ignore the no-subscriber case.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that sees all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering.
///
/// # Example
///
/// ```rust
/// use core_runtime::events::{EventBus, EventStream, CoreEvent};
///
/// let event_bus = EventBus::new(64);
/// let unlock_stream = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Unlock(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` if all senders dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
