//! Polling log panel
//!
//! Renders the entries of an `exectrace_core::Tracker` to a writer on a
//! fixed wall-clock interval, the way a debug panel polls a log source.
//! The panel owns one tokio task; closing or dropping the handle releases
//! the repeating timer unconditionally.
//!
//! Rendering is deliberately minimal: plain text lines to any `Write`
//! target. What the lines look like beyond that is left to the host.

mod render;

use std::io::{self, Write};
use std::time::Duration;

use exectrace_core::Tracker;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use render::Renderer;

/// Default wall-clock polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Target for the panel's own diagnostics. Stays under
/// [`exectrace_core::TARGET_PREFIX`], which the tracker layer skips.
const PANEL_TARGET: &str = "exectrace::panel";

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

pub type Result<T> = std::result::Result<T, PanelError>;

/// Configures a polling panel over one tracker.
///
/// ```ignore
/// let panel = LogPanel::new(tracker.clone())
///     .poll_interval(Duration::from_millis(250))
///     .show_timestamps(true)
///     .spawn()?;
/// // ...
/// panel.close().await;
/// ```
pub struct LogPanel {
    tracker: Tracker,
    poll_interval: Duration,
    show_timestamps: bool,
    target: Option<Box<dyn Write + Send>>,
}

impl LogPanel {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker,
            poll_interval: DEFAULT_POLL_INTERVAL,
            show_timestamps: false,
            target: None,
        }
    }

    /// Wall-clock time between polls. Defaults to 500 ms.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Prefix every rendered line with the entry's capture time.
    pub fn show_timestamps(mut self, on: bool) -> Self {
        self.show_timestamps = on;
        self
    }

    /// Where rendered lines go. Defaults to stdout.
    pub fn target(mut self, target: impl Write + Send + 'static) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    /// Start the polling task.
    ///
    /// The first render happens one full interval after spawn; entries
    /// recorded earlier wait for that tick. A zero interval is rejected,
    /// it would busy-loop the poller.
    pub fn spawn(self) -> Result<PanelHandle> {
        if self.poll_interval.is_zero() {
            return Err(PanelError::ZeroInterval);
        }

        let mut target = self.target.unwrap_or_else(|| Box::new(io::stdout()));
        let tracker = self.tracker;
        let mut renderer = Renderer::new(self.show_timestamps);
        let poll_interval = self.poll_interval;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tracing::debug!(
            target: PANEL_TARGET,
            interval_ms = poll_interval.as_millis() as u64,
            "log panel started"
        );

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(poll_interval);
            // An interval's first tick completes immediately; consume it
            // so rendering starts one full interval after spawn.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        renderer.render_new(&tracker, &mut *target);
                    }
                    _ = shutdown_rx.changed() => {
                        // Final drain so entries recorded just before the
                        // close are still shown.
                        renderer.render_new(&tracker, &mut *target);
                        break;
                    }
                }
            }
            tracing::debug!(target: PANEL_TARGET, "log panel stopped");
        });

        Ok(PanelHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        })
    }
}

/// Running panel task. Dropping the handle stops polling.
pub struct PanelHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PanelHandle {
    /// Stop polling after one final drain and wait for the task to
    /// finish.
    pub async fn close(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PanelHandle {
    fn drop(&mut self) {
        // Drop sites cannot await a graceful exit; abort still releases
        // the timer.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
