//! # Playback Queue Module
//!
//! Ordered, single-consumer playback of queued audio cues over one
//! device.
//!
//! ## Overview
//!
//! This module handles:
//! - Priority-ordered queueing of file and inline-encoded cues
//! - One-at-a-time drain into playback sessions with linear retry
//! - Autoplay-unlock coordination with session replay
//! - Containment of every per-cue failure behind the controller

pub mod codec;
pub mod command;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod handle;
pub mod item;
pub mod state;
pub mod store;
pub mod unlock;

pub use command::{Command, CommandOutcome};
pub use config::PlaybackConfig;
pub use controller::{CoreStatus, QueueController, QueueControllerBuilder};
pub use error::{PlaybackQueueError, Result};
pub use item::QueueItem;
