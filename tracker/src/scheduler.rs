//! Duty-cycle scheduler for the location source.

use std::sync::Arc;
use std::time::Duration;

use geobeacon_location::LocationSource;
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Sampling cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// How often the source is re-enabled.
    pub interval: Duration,
    /// How long after each enable the paired disable fires.
    pub window: Duration,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            window: Duration::from_secs(5),
        }
    }
}

/// Periodically enables the source for a short sensing window.
///
/// On start the source is enabled immediately, and again on every
/// `interval` tick; re-enabling an enabled source is a no-op, so the
/// scheduler never tracks whether sensing is currently on. Every enable
/// schedules its own one-shot disable `window` later, and a later tick
/// never cancels an earlier disable: if the windows overlap, sensing
/// simply stays on longer. The guarantee is that sensing is on for at
/// least `window` after every tick, which bounds battery draw without
/// starving the beacon of fixes.
#[derive(Debug)]
pub struct SampleScheduler {
    tick: JoinHandle<()>,
}

impl SampleScheduler {
    /// Start duty-cycling `source` on the configured cadence.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(source: Arc<dyn LocationSource>, config: SampleConfig) -> Self {
        let tick = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.interval);
            loop {
                // The first tick completes immediately: the initial sensing
                // window opens at t = 0.
                ticker.tick().await;
                if let Err(err) = source.start_updates() {
                    warn!("failed to enable location source: {err}");
                }
                let source = source.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(config.window).await;
                    source.stop_updates();
                });
            }
        });
        Self { tick }
    }

    /// Stop ticking. A disable that is already scheduled still fires;
    /// stopping a stopped source is a no-op.
    pub fn shutdown(&self) {
        self.tick.abort();
    }
}

impl Drop for SampleScheduler {
    fn drop(&mut self) {
        self.tick.abort();
    }
}
