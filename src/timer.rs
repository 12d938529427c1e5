//! Per-question countdown.
//!
//! A started timer runs as a tokio task that calls `on_tick` once per period
//! with the remaining whole periods (`duration - 1` down to `0`) and then
//! `on_expire` once. Callbacks run while holding the timer's cancel lock, so
//! once [`Timer::cancel`] returns no callback of that run can fire.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Length of one countdown step.
pub const TICK: Duration = Duration::from_secs(1);

struct ActiveRun {
    cancelled: Arc<Mutex<bool>>,
    handle: JoinHandle<()>,
}

/// A restartable countdown. At most one run is active; starting a new run
/// cancels the previous one.
pub struct Timer {
    period: Duration,
    active: Option<ActiveRun>,
}

impl Timer {
    pub fn new() -> Self {
        Self::with_period(TICK)
    }

    /// A timer whose steps last `period` (at least one millisecond).
    pub fn with_period(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            active: None,
        }
    }

    /// Start counting down `duration` periods. Must be called inside a tokio
    /// runtime.
    pub fn start<T, E>(&mut self, duration: u32, mut on_tick: T, on_expire: E)
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.cancel();

        let cancelled = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&cancelled);
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for remaining in (0..duration).rev() {
                interval.tick().await;
                if !fire(&flag, || on_tick(remaining)) {
                    return;
                }
            }
            fire(&flag, on_expire);
        });

        self.active = Some(ActiveRun { cancelled, handle });
    }

    /// Stop the active run, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(run) = self.active.take() {
            *run.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
            run.handle.abort();
        }
    }

    /// Whether a run has been started and has neither finished nor been
    /// cancelled.
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `callback` unless the run was cancelled. Returns `false` if cancelled.
fn fire(flag: &Mutex<bool>, callback: impl FnOnce()) -> bool {
    let cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
    if *cancelled {
        return false;
    }
    callback();
    true
}
