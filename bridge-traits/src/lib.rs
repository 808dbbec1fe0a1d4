//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback queue core and
//! host-specific implementations. Each trait represents a capability the core
//! requires but that must be implemented differently per host (a media
//! element on web hosts, a native audio engine on desktop, a stub in tests).
//!
//! ## Traits
//!
//! ### Audio Output
//! - [`PlaybackDevice`](playback::PlaybackDevice) - The single audio output:
//!   load/play/pause/seek/volume/mute, diagnostics, lifecycle events
//!
//! ### Presentation
//! - [`CaptionPresenter`](presentation::CaptionPresenter) - Show/hide the
//!   caption that mirrors playback state
//!
//! ### Unlock Handling
//! - [`UnlockPrompt`](unlock::UnlockPrompt) - Capture the one-time user
//!   gesture that satisfies platform autoplay policy
//! - [`UnlockNotifier`](unlock::UnlockNotifier) - Tell the host the gesture
//!   completed
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing:
//!
//! ```ignore
//! let device = builder.device.ok_or_else(|| {
//!     PlaybackQueueError::Config(
//!         "PlaybackDevice implementation is required. \
//!          Inject one with with_device() before building.".to_string(),
//!     )
//! })?;
//! ```
//!
//! Optional capabilities ship no-op defaults ([`NoopCaptionPresenter`],
//! [`NoopUnlockPrompt`], [`NoopUnlockNotifier`]) so headless hosts and tests
//! can wire only what they care about.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Host
//! implementations should convert platform-specific errors into the closest
//! variant and keep [`DeviceFailure`](playback::DeviceFailure) codes intact
//! so the core can classify autoplay blocks.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod playback;
pub mod presentation;
pub mod unlock;

pub use error::BridgeError;

// Re-export commonly used types
pub use playback::{
    AudioSource, BufferingState, DeviceDiagnostics, DeviceEvent, DeviceFailure, PlaybackDevice,
    ReadinessState,
};
pub use presentation::{CaptionPresenter, NoopCaptionPresenter};
pub use unlock::{NoopUnlockNotifier, NoopUnlockPrompt, UnlockNotifier, UnlockPrompt};
