use super::clock::Clock;
use super::timers::FlushScheduler;
use crate::core::FlushReason;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep_until;
use tracing::{Instrument, Level, event, info_span};

pub type FlushFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Work performed when a timer fires.
pub type FlushCallback = Arc<dyn Fn(FlushReason) -> FlushFuture + Send + Sync>;

/// Shared handle to the timer state plus the wake-up signal for the worker.
#[derive(Clone)]
pub struct SchedulerHandle {
    state: Arc<Mutex<FlushScheduler>>,
    wake: Arc<Notify>,
    clock: Arc<dyn Clock>,
}

impl SchedulerHandle {
    pub fn new(scheduler: FlushScheduler, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(scheduler)),
            wake: Arc::new(Notify::new()),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlushScheduler> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) {
        let now = self.clock.now();
        self.lock().start(now);
        self.wake.notify_one();
    }

    /// Restarts the debounce countdown from now.
    pub fn arm_debounce(&self) {
        let now = self.clock.now();
        self.lock().arm_debounce(now);
        self.wake.notify_one();
    }

    pub fn stop(&self) {
        self.lock().stop();
        self.wake.notify_one();
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().next_deadline()
    }

    fn poll_due(&self) -> Vec<FlushReason> {
        let now = self.clock.now();
        self.lock().poll(now)
    }
}

/// Background task that sleeps until the next timer deadline and runs the
/// flush callback.
pub struct FlushWorker {
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl FlushWorker {
    /// Signals the worker to stop and waits for it to finish.
    ///
    /// A flush already in progress completes first.
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            if let Err(err) = join_handle.await {
                event!(Level::WARN, error = %err, "flush worker join failed");
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Spawns the worker on the current tokio runtime.
///
/// Timers that come due together produce a single flush, reported under the
/// first reason.
pub fn spawn_flush_worker(handle: SchedulerHandle, on_flush: FlushCallback) -> FlushWorker {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let join_handle = tokio::spawn(async move {
        loop {
            let deadline = handle.next_deadline();
            let sleep = async move {
                match deadline {
                    Some(deadline) => sleep_until(tokio::time::Instant::from_std(deadline)).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = &mut stop_rx => {
                    break;
                }
                _ = handle.wake.notified() => {
                    continue;
                }
                _ = sleep => {
                    let due = handle.poll_due();
                    let Some(&reason) = due.first() else {
                        continue;
                    };
                    let span = info_span!("history.flush", reason = %reason, due = due.len());
                    on_flush(reason).instrument(span).await;
                }
            }
        }
        event!(Level::DEBUG, "flush worker stopped");
    });

    FlushWorker {
        stop_tx: Some(stop_tx),
        join_handle: Some(join_handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::clock::TokioClock;
    use std::time::Duration;

    fn recording() -> (FlushCallback, Arc<Mutex<Vec<(FlushReason, tokio::time::Instant)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let callback: FlushCallback = Arc::new(move |reason: FlushReason| -> FlushFuture {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock()
                    .unwrap()
                    .push((reason, tokio::time::Instant::now()));
            })
        });
        (callback, log)
    }

    fn handle() -> SchedulerHandle {
        SchedulerHandle::new(
            FlushScheduler::new(Duration::from_secs(60), Duration::from_secs(5)),
            Arc::new(TokioClock),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_burst_flushes_once() {
        let handle = handle();
        let (callback, log) = recording();
        let worker = spawn_flush_worker(handle.clone(), callback);

        let began = tokio::time::Instant::now();
        for _ in 0..5 {
            handle.arm_debounce();
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        let last_arm = began + Duration::from_secs(8);
        tokio::time::sleep(Duration::from_secs(10)).await;

        let flushes = log.lock().unwrap().clone();
        assert_eq!(flushes.len(), 1);
        assert_eq!(flushes[0].0, FlushReason::Debounced);
        assert_eq!(flushes[0].1, last_arm + Duration::from_secs(5));

        worker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_flush_runs_without_activity() {
        let handle = handle();
        let (callback, log) = recording();
        handle.start();
        let worker = spawn_flush_worker(handle.clone(), callback);

        tokio::time::sleep(Duration::from_secs(185)).await;

        let reasons: Vec<_> = log.lock().unwrap().iter().map(|(r, _)| *r).collect();
        assert_eq!(reasons, vec![FlushReason::Periodic; 3]);

        worker.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_worker_never_flushes() {
        let handle = handle();
        let (callback, log) = recording();
        let worker = spawn_flush_worker(handle.clone(), callback);
        handle.arm_debounce();
        worker.stop().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(log.lock().unwrap().is_empty());
    }
}
