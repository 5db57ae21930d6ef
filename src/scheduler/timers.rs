//! Clock-independent state of the two flush timers.
//!
//! Nothing here sleeps. Callers feed in the current instant and learn which
//! flushes are due, which keeps the scheduling rules testable without a
//! runtime.

use crate::core::FlushReason;
use std::time::{Duration, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicTimer {
    Stopped,
    Running { next: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceTimer {
    Idle,
    Armed { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct FlushScheduler {
    flush_interval: Duration,
    debounce_interval: Duration,
    periodic: PeriodicTimer,
    debounce: DebounceTimer,
}

impl FlushScheduler {
    pub fn new(flush_interval: Duration, debounce_interval: Duration) -> Self {
        Self {
            flush_interval: flush_interval.max(MIN_INTERVAL),
            debounce_interval: debounce_interval.max(MIN_INTERVAL),
            periodic: PeriodicTimer::Stopped,
            debounce: DebounceTimer::Idle,
        }
    }

    pub fn periodic(&self) -> PeriodicTimer {
        self.periodic
    }

    pub fn debounce(&self) -> DebounceTimer {
        self.debounce
    }

    /// Starts the periodic timer; its first tick is one interval from `now`.
    pub fn start(&mut self, now: Instant) {
        if let PeriodicTimer::Stopped = self.periodic {
            self.periodic = PeriodicTimer::Running {
                next: now + self.flush_interval,
            };
        }
    }

    /// (Re)arms the debounce timer with a full interval from `now`.
    pub fn arm_debounce(&mut self, now: Instant) {
        self.debounce = DebounceTimer::Armed {
            deadline: now + self.debounce_interval,
        };
    }

    /// Disarms both timers.
    pub fn stop(&mut self) {
        self.periodic = PeriodicTimer::Stopped;
        self.debounce = DebounceTimer::Idle;
    }

    /// Earliest instant at which `poll` will report a flush.
    pub fn next_deadline(&self) -> Option<Instant> {
        let periodic = match self.periodic {
            PeriodicTimer::Running { next } => Some(next),
            PeriodicTimer::Stopped => None,
        };
        let debounce = match self.debounce {
            DebounceTimer::Armed { deadline } => Some(deadline),
            DebounceTimer::Idle => None,
        };
        match (periodic, debounce) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fires every timer whose deadline is at or before `now`.
    ///
    /// A fired debounce timer returns to idle. The periodic timer moves to
    /// its next tick after `now`; ticks missed while nobody polled collapse
    /// into one flush.
    pub fn poll(&mut self, now: Instant) -> Vec<FlushReason> {
        let mut due = Vec::new();

        match self.debounce {
            DebounceTimer::Armed { deadline } if deadline <= now => {
                self.debounce = DebounceTimer::Idle;
                due.push(FlushReason::Debounced);
            }
            _ => {}
        }

        match self.periodic {
            PeriodicTimer::Running { mut next } if next <= now => {
                while next <= now {
                    next += self.flush_interval;
                }
                self.periodic = PeriodicTimer::Running { next };
                due.push(FlushReason::Periodic);
            }
            _ => {}
        }

        due
    }
}
