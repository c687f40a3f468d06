//! Periodic sweep scheduling.
//!
//! The scheduler owns at most one background tokio task. The task ticks every
//! `cleanup_interval` and runs the supplied tick function. Interval changes
//! arrive through a watch channel and re-arm the ticker without restarting
//! the task; a tick already running is never interrupted.

use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Longest period the ticker is armed with. Larger intervals are clamped so
/// deadline arithmetic on `Instant` cannot overflow.
const MAX_TICK_PERIOD: Duration = Duration::from_secs(86400 * 365 * 30);

struct CleanupTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drives a cancellable periodic task.
pub struct Scheduler {
    interval_tx: watch::Sender<Duration>,
    task: Mutex<Option<CleanupTask>>,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        let (interval_tx, _) = watch::channel(interval);
        Self {
            interval_tx,
            task: Mutex::new(None),
        }
    }

    /// Current tick period.
    pub fn interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    /// Change the tick period. A running task picks it up before its next tick.
    pub fn set_interval(&self, interval: Duration) {
        let changed = self.interval_tx.send_if_modified(|current| {
            if *current == interval {
                false
            } else {
                *current = interval;
                true
            }
        });
        if changed {
            debug!(interval_ms = interval.as_millis() as u64, "Cleanup interval updated");
        }
    }

    /// Whether a background task is currently alive.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Spawn the periodic task on the current tokio runtime.
    ///
    /// Does nothing if a task is already running. The task ends when `tick`
    /// returns [`ControlFlow::Break`] or when [`stop`](Self::stop) is called.
    pub fn start<F>(&self, mut tick: F) -> Result<()>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let mut slot = self.task.lock();
        if slot.as_ref().is_some_and(|task| !task.handle.is_finished()) {
            debug!("Cleanup task already running");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let mut interval_rx = self.interval_tx.subscribe();

        let handle = runtime.spawn(async move {
            loop {
                let period = (*interval_rx.borrow_and_update()).min(MAX_TICK_PERIOD);
                let now = Instant::now();
                let start = now.checked_add(period).unwrap_or(now);
                let mut ticker = tokio::time::interval_at(start, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                info!(interval_ms = period.as_millis() as u64, "Session cleanup scheduled");

                loop {
                    tokio::select! {
                        biased;
                        _ = cancelled.cancelled() => return,
                        changed = interval_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            // Re-arm the ticker with the new period.
                            break;
                        }
                        _ = ticker.tick() => {
                            if tick().is_break() {
                                debug!("Cleanup target dropped, stopping task");
                                return;
                            }
                        }
                    }
                }
            }
        });

        *slot = Some(CleanupTask { token, handle });
        Ok(())
    }

    /// Stop the periodic task and wait for it to exit.
    ///
    /// Once this returns no further tick will run. Returns whether a task was
    /// running.
    pub async fn stop(&self) -> bool {
        let task = self.task.lock().take();
        let Some(task) = task else {
            return false;
        };

        task.token.cancel();
        if let Err(e) = task.handle.await {
            warn!(error = %e, "Cleanup task ended abnormally");
        }
        info!("Session cleanup stopped");
        true
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.token.cancel();
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("interval", &self.interval())
            .field("running", &self.is_running())
            .finish()
    }
}
