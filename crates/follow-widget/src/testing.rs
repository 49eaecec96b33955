//! Test doubles shared by unit and integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::sync::lock;
use crate::timeout::{Scheduler, TimerHandle};

type ScheduledTask = Box<dyn FnOnce() + Send>;

struct PendingTimer {
    cancelled: Arc<AtomicBool>,
    task: ScheduledTask,
}

/// Scheduler whose timers only fire when the test says so.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<PendingTimer>>,
    last_delay: Mutex<Option<Duration>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers scheduled and not yet fired.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Delay passed to the most recent `schedule` call.
    pub fn last_delay(&self) -> Option<Duration> {
        *lock(&self.last_delay)
    }

    /// Fire every pending timer that has not been cancelled, in scheduling
    /// order. Cancelled timers are discarded.
    pub fn fire_all(&self) {
        let drained: Vec<PendingTimer> = lock(&self.pending).drain(..).collect();
        for timer in drained {
            if !timer.cancelled.load(Ordering::SeqCst) {
                (timer.task)();
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        *lock(&self.last_delay) = Some(delay);
        lock(&self.pending).push(PendingTimer {
            cancelled: Arc::clone(&cancelled),
            task,
        });
        TimerHandle::new(cancelled)
    }
}
