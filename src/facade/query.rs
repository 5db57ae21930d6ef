use crate::store::HistoryStore;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// The store as shared between the manager, its flush worker, and readers.
pub type SharedStore = Arc<RwLock<HistoryStore>>;

pub(crate) fn read_store(store: &SharedStore) -> RwLockReadGuard<'_, HistoryStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

/// Read-side access to channel histories.
pub trait HistorySource {
    /// Full log for `channel`, oldest first.
    fn get_messages(&self, channel: &str) -> Vec<String>;

    /// Deduplicated, case-insensitively filtered log, oldest first.
    fn get_filtered(&self, channel: &str, term: &str) -> Vec<String>;
}

impl HistorySource for HistoryStore {
    fn get_messages(&self, channel: &str) -> Vec<String> {
        self.get_all(channel)
    }

    fn get_filtered(&self, channel: &str, term: &str) -> Vec<String> {
        HistoryStore::get_filtered(self, channel, term)
    }
}

/// Cheap, cloneable read-only handle for collaborators such as a search popup.
///
/// It offers no way to append or to touch persistence.
#[derive(Clone)]
pub struct HistoryQuery {
    store: SharedStore,
}

impl HistoryQuery {
    pub(crate) fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn channels(&self) -> Vec<String> {
        read_store(&self.store).channels()
    }
}

impl HistorySource for HistoryQuery {
    fn get_messages(&self, channel: &str) -> Vec<String> {
        read_store(&self.store).get_all(channel)
    }

    fn get_filtered(&self, channel: &str, term: &str) -> Vec<String> {
        read_store(&self.store).get_filtered(channel, term)
    }
}

impl std::fmt::Debug for HistoryQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryQuery").finish_non_exhaustive()
    }
}
