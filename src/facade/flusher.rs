use super::query::{SharedStore, read_store};
use crate::core::{FlushReason, HistoryError, Result};
use crate::snapshot::encode;
use crate::storage::DurableWriter;
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Counters describing flush activity since the manager was created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub flushes: u64,
    pub failures: u64,
    /// Flushes dropped because a newer copy had already been committed.
    pub stale_skipped: u64,
    pub periodic: u64,
    pub debounced: u64,
    pub shutdown: u64,
    pub manual: u64,
    pub last_error: Option<String>,
}

impl FlushStats {
    fn record(&mut self, reason: FlushReason, result: &Result<Commit>) {
        match reason {
            FlushReason::Periodic => self.periodic += 1,
            FlushReason::Debounced => self.debounced += 1,
            FlushReason::Shutdown => self.shutdown += 1,
            FlushReason::Manual => self.manual += 1,
        }
        match result {
            Ok(Commit::Written) => self.flushes += 1,
            Ok(Commit::Stale) => self.stale_skipped += 1,
            Err(err) => {
                self.failures += 1;
                self.last_error = Some(err.to_string());
            }
        }
    }
}

/// Encoded copy of the store tagged with the order in which it was taken.
#[derive(Debug)]
struct PreparedSnapshot {
    generation: u64,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    Written,
    Stale,
}

/// Copies the store, encodes it, and commits it through the durable writer.
///
/// Copies are numbered while the store read lock is held, and commits are
/// serialized behind the last committed number, so a slow commit of an older
/// copy can never replace a newer file.
pub struct SnapshotFlusher {
    store: SharedStore,
    writer: DurableWriter,
    next_generation: AtomicU64,
    committed: Mutex<u64>,
    stats: Mutex<FlushStats>,
}

impl SnapshotFlusher {
    pub fn new(store: SharedStore, writer: DurableWriter) -> Self {
        Self {
            store,
            writer,
            next_generation: AtomicU64::new(1),
            committed: Mutex::new(0),
            stats: Mutex::new(FlushStats::default()),
        }
    }

    pub fn writer(&self) -> &DurableWriter {
        &self.writer
    }

    /// Copies and encodes the current store. The read lock is held only
    /// while copying.
    fn prepare(&self) -> Result<PreparedSnapshot> {
        let (generation, document) = {
            let store = read_store(&self.store);
            let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
            (generation, store.to_document())
        };
        debug!(
            "encoding snapshot: generation={} channels={} messages={}",
            generation,
            document.channel_count(),
            document.message_count()
        );
        Ok(PreparedSnapshot {
            generation,
            bytes: encode(&document)?,
        })
    }

    fn commit(&self, snapshot: PreparedSnapshot) -> Result<Commit> {
        let mut committed = self
            .committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshot.generation < *committed {
            debug!(
                "skipping stale snapshot: generation={} committed={}",
                snapshot.generation, *committed
            );
            return Ok(Commit::Stale);
        }
        self.writer.commit(&snapshot.bytes)?;
        *committed = snapshot.generation;
        Ok(Commit::Written)
    }

    /// Flushes on the calling thread.
    pub fn flush_blocking(&self, reason: FlushReason) -> Result<()> {
        let result = self.prepare().and_then(|snapshot| self.commit(snapshot));
        self.finish(reason, result)
    }

    /// Flushes with the disk write moved onto tokio's blocking pool.
    pub async fn flush(self: Arc<Self>, reason: FlushReason) -> Result<()> {
        let result = match self.prepare() {
            Ok(snapshot) => {
                let flusher = self.clone();
                tokio::task::spawn_blocking(move || flusher.commit(snapshot))
                    .await
                    .unwrap_or_else(|err| {
                        Err(HistoryError::Io(format!("snapshot commit task failed: {}", err)))
                    })
            }
            Err(err) => Err(err),
        };
        self.finish(reason, result)
    }

    pub fn stats(&self) -> FlushStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn finish(&self, reason: FlushReason, result: Result<Commit>) -> Result<()> {
        match &result {
            Ok(Commit::Written) => debug!("history flushed: reason={}", reason),
            Ok(Commit::Stale) => debug!("history flush superseded: reason={}", reason),
            Err(err) => warn!(
                "history flush failed, previous snapshot kept: reason={} path='{}' error='{}'",
                reason,
                self.writer.path().display(),
                err
            ),
        }
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(reason, &result);
        result.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::decode;
    use crate::store::HistoryStore;
    use std::sync::RwLock;

    fn shared() -> SharedStore {
        Arc::new(RwLock::new(HistoryStore::new()))
    }

    #[test]
    fn test_flush_blocking_writes_current_state() {
        let temp = tempfile::tempdir().unwrap();
        let store = shared();
        store.write().unwrap().append("c", "persist me");
        let flusher = SnapshotFlusher::new(
            store.clone(),
            DurableWriter::new(temp.path().join("h.json")),
        );

        flusher.flush_blocking(FlushReason::Manual).unwrap();

        let bytes = flusher.writer().load().unwrap().unwrap();
        assert_eq!(decode(&bytes).unwrap().channels["c"], vec!["persist me"]);
        let stats = flusher.stats();
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.manual, 1);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn test_failed_flush_is_counted() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let flusher = SnapshotFlusher::new(
            shared(),
            DurableWriter::new(blocker.join("h.json")),
        );

        let err = flusher.flush_blocking(FlushReason::Periodic).unwrap_err();
        assert!(matches!(err, HistoryError::Io(_)));
        let stats = flusher.stats();
        assert_eq!(stats.flushes, 0);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.periodic, 1);
        assert!(stats.last_error.is_some());
    }

    #[tokio::test]
    async fn test_async_flush_commits() {
        let temp = tempfile::tempdir().unwrap();
        let store = shared();
        store.write().unwrap().append("c", "async");
        let flusher = Arc::new(SnapshotFlusher::new(
            store,
            DurableWriter::new(temp.path().join("h.json")),
        ));

        flusher.clone().flush(FlushReason::Debounced).await.unwrap();
        assert!(flusher.writer().exists());
        assert_eq!(flusher.stats().debounced, 1);
    }

    #[test]
    fn test_older_copy_never_replaces_newer_commit() {
        let temp = tempfile::tempdir().unwrap();
        let store = shared();
        let flusher = SnapshotFlusher::new(
            store.clone(),
            DurableWriter::new(temp.path().join("h.json")),
        );

        store.write().unwrap().append("c", "early");
        let older = flusher.prepare().unwrap();
        store.write().unwrap().append("c", "FINAL");
        let newer = flusher.prepare().unwrap();
        assert!(older.generation < newer.generation);

        assert_eq!(flusher.commit(newer).unwrap(), Commit::Written);
        assert_eq!(flusher.commit(older).unwrap(), Commit::Stale);

        let bytes = flusher.writer().load().unwrap().unwrap();
        assert_eq!(decode(&bytes).unwrap().channels["c"], vec!["early", "FINAL"]);
    }

    #[test]
    fn test_failed_commit_does_not_block_older_retry() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("h.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), b"x").unwrap();
        let store = shared();
        store.write().unwrap().append("c", "one");
        let flusher = SnapshotFlusher::new(store, DurableWriter::new(&target));

        let first = flusher.prepare().unwrap();
        let second = flusher.prepare().unwrap();
        assert!(flusher.commit(second).is_err());

        std::fs::remove_dir_all(&target).unwrap();
        assert_eq!(flusher.commit(first).unwrap(), Commit::Written);
    }

    #[tokio::test]
    async fn test_stats_count_superseded_flushes() {
        let temp = tempfile::tempdir().unwrap();
        let store = shared();
        store.write().unwrap().append("c", "x");
        let flusher = Arc::new(SnapshotFlusher::new(
            store,
            DurableWriter::new(temp.path().join("h.json")),
        ));

        let stale = flusher.prepare().unwrap();
        flusher.clone().flush(FlushReason::Shutdown).await.unwrap();
        let result = flusher.commit(stale);
        flusher.finish(FlushReason::Periodic, result).unwrap();

        let stats = flusher.stats();
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.stale_skipped, 1);
        assert_eq!(stats.failures, 0);
    }
}
