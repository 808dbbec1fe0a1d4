//! Caption presentation bridge.

use crate::error::Result;

/// Host surface that mirrors playback state with a visible caption.
///
/// The core calls `show_caption` when the device reports audible playback and
/// `hide_caption` when the session ends or aborts. What the caption says is
/// the host's business; the core only toggles visibility.
#[async_trait::async_trait]
pub trait CaptionPresenter: Send + Sync {
    async fn show_caption(&self) -> Result<()>;

    async fn hide_caption(&self) -> Result<()>;
}

/// Presenter that ignores every request. Default for hosts without a
/// caption surface.
#[derive(Debug, Clone, Default)]
pub struct NoopCaptionPresenter;

#[async_trait::async_trait]
impl CaptionPresenter for NoopCaptionPresenter {
    async fn show_caption(&self) -> Result<()> {
        Ok(())
    }

    async fn hide_caption(&self) -> Result<()> {
        Ok(())
    }
}
