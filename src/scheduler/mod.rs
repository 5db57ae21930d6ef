//! Periodic and debounced flush timers.

pub mod clock;
pub mod timers;
pub mod worker;

pub use clock::{Clock, ManualClock, TokioClock};
pub use timers::{DebounceTimer, FlushScheduler, PeriodicTimer};
pub use worker::{FlushCallback, FlushFuture, FlushWorker, SchedulerHandle, spawn_flush_worker};
