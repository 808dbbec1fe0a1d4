//! Unlock prompt and unlock-completion bridges.
//!
//! Some platforms refuse autonomous audio playback until the user has
//! interacted with the page or app at least once. The core asks the host to
//! present a one-time prompt through [`UnlockPrompt`]; once the gesture
//! lands, the host is told through [`UnlockNotifier`] so it can release
//! focus or tear down whatever surface captured the interaction.

use crate::error::Result;

/// Host surface that captures the unlock gesture.
#[async_trait::async_trait]
pub trait UnlockPrompt: Send + Sync {
    /// Present the prompt and suspend until the user gesture arrives.
    ///
    /// The core guarantees at most one `present` call is outstanding at a
    /// time. An error means the gesture could not be captured; the core
    /// leaves unlock state untouched and may ask again later.
    async fn present(&self) -> Result<()>;

    /// Tear the prompt down after the gesture completed.
    async fn dismiss(&self) -> Result<()> {
        Ok(())
    }
}

/// Outbound notification that the unlock gesture finished.
#[async_trait::async_trait]
pub trait UnlockNotifier: Send + Sync {
    /// Called exactly once per completed gesture. Failures are swallowed by
    /// the core; this is a courtesy signal, not a required handshake.
    async fn notify_unlock_complete(&self) -> Result<()>;
}

/// Prompt that grants the gesture immediately. Suitable for hosts without
/// autoplay restrictions (tests, headless runs).
#[derive(Debug, Clone, Default)]
pub struct NoopUnlockPrompt;

#[async_trait::async_trait]
impl UnlockPrompt for NoopUnlockPrompt {
    async fn present(&self) -> Result<()> {
        Ok(())
    }
}

/// Notifier that drops the signal.
#[derive(Debug, Clone, Default)]
pub struct NoopUnlockNotifier;

#[async_trait::async_trait]
impl UnlockNotifier for NoopUnlockNotifier {
    async fn notify_unlock_complete(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_prompt_grants_and_dismisses() {
        let prompt = NoopUnlockPrompt;
        prompt.present().await.unwrap();
        prompt.dismiss().await.unwrap();
    }

    #[tokio::test]
    async fn noop_notifier_accepts_signal() {
        let notifier = NoopUnlockNotifier;
        notifier.notify_unlock_complete().await.unwrap();
    }
}
