//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    let mut args = env::args().skip(1);

    let format = match args.next().as_deref() {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some(_) | None => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);
    if let Some(filter) = args.next() {
        config = config.with_filter(filter);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging System Demo ===");
    info!(format = ?format, "Logging initialized");

    // Demonstrate different log levels
    demo_log_levels();

    // Demonstrate structured logging
    demo_structured_logging();

    // Demonstrate spans for tracing
    demo_spans().await;

    // Demonstrate instrumentation
    demo_instrumentation().await;

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("Drain skipped, session busy");
    debug!("Cue enqueued");
    info!("Playback started");
    warn!("Play attempt failed, retrying");
    error!("Playback device reported failure");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!("Simple message without fields");

    info!(
        kind = "file",
        priority = 3,
        queue_length = 4usize,
        "Cue enqueued"
    );

    info!(
        attempt = 2,
        delay_ms = 200u64,
        queue_length = 3usize,
        "Retry scheduled"
    );
}

async fn demo_spans() {
    let span = span!(Level::INFO, "playback_session", label = "assets/chime.ogg");
    let _enter = span.enter();

    info!("Starting playback session");

    {
        let inner_span = span!(Level::DEBUG, "load_source");
        let _inner = inner_span.enter();

        debug!(volume = 0.8, "Source bound, buffering requested");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    {
        let inner_span = span!(Level::DEBUG, "play_attempts");
        let _inner = inner_span.enter();

        debug!(attempt = 1, "Play attempt succeeded");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    info!(attempt = 1, "Session playing");
}

#[instrument]
async fn demo_instrumentation() {
    info!("Instrumented function automatically creates spans");

    let cues = vec!["chime.ogg", "alert.ogg", "done.ogg"];
    drain_cues(&cues).await;
}

#[instrument(fields(count = cues.len()))]
async fn drain_cues(cues: &[&str]) {
    debug!("Draining queued cues");

    for (idx, cue) in cues.iter().enumerate() {
        drain_cue(idx, cue).await;
    }

    info!("Queue drained");
}

#[instrument(fields(position = idx))]
async fn drain_cue(idx: usize, cue: &str) {
    trace!(cue = %cue, "Draining cue");
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
}
