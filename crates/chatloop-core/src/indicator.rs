//! Cancellable "thinking" progress indicator.
//!
//! The indicator runs as its own task, repainting on a fixed tick until its
//! cancellation token fires. [`ThinkingIndicator::stop`] cancels and then
//! awaits the task, so the indicator line is cleared before anything else is
//! printed.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default repaint interval.
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Terminal surface the indicator paints on.
pub trait IndicatorDisplay: Send + Sync + 'static {
    /// Advance one frame.
    fn tick(&self);
    /// Erase the indicator line. Called once, after the last tick.
    fn clear(&self);
}

pub struct ThinkingIndicator {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ThinkingIndicator {
    /// Spawn the indicator task. Must be called inside a Tokio runtime.
    pub fn start(display: Arc<dyn IndicatorDisplay>, tick: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => display.tick(),
                }
            }
            display.clear();
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// An indicator that never paints, for when the feature is switched off.
    pub fn disabled() -> Self {
        Self {
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel the task and wait for it to clear its line. Idempotent.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                debug!(error = %e, "Thinking indicator task ended abnormally");
            }
        }
    }
}

impl Drop for ThinkingIndicator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
