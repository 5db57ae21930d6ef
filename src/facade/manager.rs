use super::flusher::{FlushStats, SnapshotFlusher};
use super::query::{HistoryQuery, HistorySource, SharedStore, read_store};
use crate::config::HistoryConfig;
use crate::core::{FlushReason, HistoryError, Result};
use crate::scheduler::{
    Clock, FlushCallback, FlushFuture, FlushScheduler, FlushWorker, SchedulerHandle, TokioClock,
    spawn_flush_worker,
};
use crate::snapshot::decode;
use crate::store::HistoryStore;
use crate::storage::DurableWriter;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Result of reading the snapshot file at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { channels: usize, messages: usize },
    /// No snapshot yet; the normal first-run state.
    Missing,
    /// The file could not be read or was not acceptable; the store starts empty.
    Rejected(HistoryError),
    /// `start` was called on a manager that is already running.
    AlreadyRunning,
}

type MessageObserver = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Owns the history store, its snapshot file, and the flush timers.
///
/// Construct one at the application's composition root and hand out
/// [`HistoryQuery`] handles to readers.
///
/// # Examples
///
/// ```no_run
/// use chathistory::{ChatHistoryManager, HistoryConfig, HistorySource};
///
/// # async fn run() -> chathistory::Result<()> {
/// let mut manager = ChatHistoryManager::new(HistoryConfig::new("/var/lib/app/misc"))?;
/// manager.start().await;
///
/// manager.add_message("twitch:pajlada", "!song");
/// let recent = manager.get_filtered("twitch:pajlada", "song");
/// assert_eq!(recent, vec!["!song"]);
///
/// manager.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct ChatHistoryManager {
    config: HistoryConfig,
    store: SharedStore,
    flusher: Arc<SnapshotFlusher>,
    scheduler: SchedulerHandle,
    worker: Option<FlushWorker>,
    observers: Vec<MessageObserver>,
    running: bool,
}

impl ChatHistoryManager {
    pub fn new(config: HistoryConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    /// Like [`ChatHistoryManager::new`] with the timer clock supplied by the
    /// caller.
    pub fn with_clock(config: HistoryConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let store: SharedStore = Arc::new(RwLock::new(HistoryStore::with_capacity_limit(
            config.max_per_channel,
        )));
        let writer = DurableWriter::new(config.snapshot_path());
        let flusher = Arc::new(SnapshotFlusher::new(store.clone(), writer));
        let scheduler = SchedulerHandle::new(
            FlushScheduler::new(config.flush_interval, config.debounce_interval),
            clock,
        );

        Ok(Self {
            config,
            store,
            flusher,
            scheduler,
            worker: None,
            observers: Vec::new(),
            running: false,
        })
    }

    pub fn snapshot_path(&self) -> &Path {
        self.flusher.writer().path()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Loads the snapshot, starts the periodic timer, and spawns the flush
    /// worker. Must be called from within a tokio runtime.
    pub async fn start(&mut self) -> LoadOutcome {
        if self.running {
            warn!("chat history manager already running");
            return LoadOutcome::AlreadyRunning;
        }

        let outcome = self.load();
        self.scheduler.start();

        let flusher = self.flusher.clone();
        let on_flush: FlushCallback = Arc::new(move |reason: FlushReason| -> FlushFuture {
            let flusher = flusher.clone();
            Box::pin(async move {
                // Failures are logged and counted by the flusher; the next
                // timer retries.
                let _ = flusher.flush(reason).await;
            })
        });
        self.worker = Some(spawn_flush_worker(self.scheduler.clone(), on_flush));
        self.running = true;

        info!(
            "chat history started: path='{}' outcome={:?}",
            self.snapshot_path().display(),
            outcome
        );
        outcome
    }

    /// Replaces the in-memory store with the snapshot on disk.
    ///
    /// Nothing is applied unless the whole file is accepted.
    pub fn load(&self) -> LoadOutcome {
        let bytes = match self.flusher.writer().load() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("no chat history snapshot at '{}'", self.snapshot_path().display());
                return LoadOutcome::Missing;
            }
            Err(err) => {
                warn!("failed to read chat history snapshot: {}", err);
                return LoadOutcome::Rejected(err);
            }
        };

        let document = match decode(&bytes) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "ignoring chat history snapshot '{}': {}",
                    self.snapshot_path().display(),
                    err
                );
                return LoadOutcome::Rejected(err);
            }
        };

        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        store.load(document);
        LoadOutcome::Loaded {
            channels: store.channels().len(),
            messages: store.total_messages(),
        }
    }

    /// Records a line the user sent in `channel`.
    ///
    /// Blank input and repeats of the newest entry are ignored. A stored
    /// message restarts the debounce countdown and notifies observers.
    pub fn add_message(&self, channel: &str, message: &str) {
        let outcome = self
            .store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(channel, message);

        if !outcome.changed() {
            return;
        }
        self.scheduler.arm_debounce();
        for observer in &self.observers {
            observer(channel, message);
        }
    }

    pub fn get_messages(&self, channel: &str) -> Vec<String> {
        read_store(&self.store).get_all(channel)
    }

    pub fn get_filtered(&self, channel: &str, term: &str) -> Vec<String> {
        read_store(&self.store).get_filtered(channel, term)
    }

    /// Read-only handle that stays valid for the manager's lifetime.
    pub fn query(&self) -> HistoryQuery {
        HistoryQuery::new(self.store.clone())
    }

    /// Registers a callback run after every stored message.
    pub fn on_message_added<F>(&mut self, observer: F)
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Writes a snapshot now, on the calling thread.
    pub fn flush_now(&self) -> Result<()> {
        self.flusher.flush_blocking(FlushReason::Manual)
    }

    pub fn flush_stats(&self) -> FlushStats {
        self.flusher.stats()
    }

    /// Writes a final snapshot, then disarms the timers and stops the worker.
    ///
    /// The result of the final write is returned; the timers are torn down
    /// either way.
    pub async fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        let result = self.flusher.clone().flush(FlushReason::Shutdown).await;

        self.scheduler.stop();
        if let Some(worker) = self.worker.take() {
            worker.stop().await;
        }
        self.running = false;
        info!("chat history stopped");
        result
    }
}

impl HistorySource for ChatHistoryManager {
    fn get_messages(&self, channel: &str) -> Vec<String> {
        ChatHistoryManager::get_messages(self, channel)
    }

    fn get_filtered(&self, channel: &str, term: &str) -> Vec<String> {
        ChatHistoryManager::get_filtered(self, channel, term)
    }
}

impl Drop for ChatHistoryManager {
    fn drop(&mut self) {
        if !self.running {
            return;
        }
        self.scheduler.stop();
        if let Err(err) = self.flusher.flush_blocking(FlushReason::Shutdown) {
            warn!("final chat history flush on drop failed: {}", err);
        }
    }
}

impl std::fmt::Debug for ChatHistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHistoryManager")
            .field("config", &self.config)
            .field("running", &self.running)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
