//! Load-timeout guard over a pluggable scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::sync::lock;

/// Cancellation handle for one scheduled timer.
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self {
            cancelled,
            abort: None,
        }
    }

    /// Handle that additionally runs `abort` on cancellation, for
    /// schedulers that can tear the timer down eagerly.
    pub fn with_abort(cancelled: Arc<AtomicBool>, abort: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            cancelled,
            abort: Some(abort),
        }
    }

    pub fn cancel(mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(abort) = self.abort.take() {
            abort();
        }
    }
}

/// One-shot timer scheduling seam.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle;
}

/// Tokio-backed scheduler. Requires a running runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::SeqCst) {
                task();
            }
        });
        let abort = join.abort_handle();
        TimerHandle::with_abort(cancelled, Box::new(move || abort.abort()))
    }
}

/// Guard around the single frame-load timer. Arming always cancels the
/// prior timer first, so at most one timer is live per guard and a timer
/// fires at most once per arming.
pub struct LoadTimeoutGuard {
    scheduler: Arc<dyn Scheduler>,
    timeout: Duration,
    active: Arc<Mutex<Option<TimerHandle>>>,
}

impl LoadTimeoutGuard {
    pub fn new(scheduler: Arc<dyn Scheduler>, timeout: Duration) -> Self {
        Self {
            scheduler,
            timeout,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Cancel any live timer and start a new one running `task` on expiry.
    /// A fired timer clears its own slot before running the task.
    pub fn arm(&self, task: Box<dyn FnOnce() + Send>) {
        self.disarm();
        let active = Arc::clone(&self.active);
        let wrapped = Box::new(move || {
            lock(&active).take();
            task();
        });
        *lock(&self.active) = Some(self.scheduler.schedule(self.timeout, wrapped));
    }

    /// Cancel the live timer if present; idempotent.
    pub fn disarm(&self) {
        if let Some(handle) = lock(&self.active).take() {
            handle.cancel();
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.active).is_some()
    }
}
