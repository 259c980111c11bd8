//! Cooperative completion poller timer.
//!
//! Not a thread: the host's event loop calls [`CompletionPoller::due`] and the
//! owning engine checks its stream whenever it returns true.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CompletionPoller {
    interval: Duration,
    next_due: Option<Instant>,
}

impl CompletionPoller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the timer. The first check is due one interval after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True when a check is due; reschedules the next one.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(deadline) if now >= deadline => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
