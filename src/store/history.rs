use super::filter::filter_recent_unique;
use super::channel_log::ChannelLog;
use crate::core::MAX_HISTORY_PER_CHANNEL;
use crate::core::types::preview;
use crate::snapshot::SnapshotDocument;
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// What `HistoryStore::append` did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The message was stored; `evicted` old entries were dropped to make room.
    Appended { evicted: usize },
    /// The message equals the channel's newest entry.
    DuplicateSkipped,
    /// Blank channel or blank message.
    Rejected,
}

impl AppendOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, Self::Appended { .. })
    }
}

/// In-memory map of channel key to message log.
///
/// Channel keys are opaque and case-sensitive. A channel whose log is empty
/// reads exactly like one that was never seen.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    channels: HashMap<String, ChannelLog>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::with_capacity_limit(MAX_HISTORY_PER_CHANNEL)
    }

    /// A store that keeps at most `capacity` entries per channel.
    ///
    /// A zero capacity is raised to one.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            channels: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&mut self, channel: &str, message: &str) -> AppendOutcome {
        if channel.trim().is_empty() || message.trim().is_empty() {
            debug!("history append rejected: empty channel or message");
            return AppendOutcome::Rejected;
        }

        let capacity = self.capacity;
        let log = self.channels.entry(channel.to_string()).or_default();
        match log.push(message, capacity) {
            None => {
                debug!(
                    "history append skipped duplicate: channel='{}' message='{}'",
                    channel,
                    preview(message)
                );
                AppendOutcome::DuplicateSkipped
            }
            Some(evicted) => {
                debug!(
                    "history append: channel='{}' total={} evicted={}",
                    channel,
                    log.len(),
                    evicted
                );
                AppendOutcome::Appended { evicted }
            }
        }
    }

    /// The channel's log, oldest first, as an owned copy.
    pub fn get_all(&self, channel: &str) -> Vec<String> {
        self.channels
            .get(channel)
            .map(ChannelLog::to_vec)
            .unwrap_or_default()
    }

    /// Matching entries, oldest first, with only the newest copy of each
    /// repeated text. An empty `term` is the same as `get_all`.
    pub fn get_filtered(&self, channel: &str, term: &str) -> Vec<String> {
        let Some(log) = self.channels.get(channel) else {
            return Vec::new();
        };
        let filtered = filter_recent_unique(log.iter(), term);
        debug!(
            "history filter: channel='{}' term='{}' total={} matched={}",
            channel,
            preview(term),
            log.len(),
            filtered.len()
        );
        filtered
    }

    /// Channel keys with at least one entry, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .channels
            .iter()
            .filter(|(_, log)| !log.is_empty())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, ChannelLog::len)
    }

    pub fn total_messages(&self) -> usize {
        self.channels.values().map(ChannelLog::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.values().all(ChannelLog::is_empty)
    }

    /// Replaces the whole store with the contents of `document`.
    ///
    /// Entries pass through the same rules as live appends: blank text and
    /// repeated neighbours are dropped and each log is capped.
    pub fn load(&mut self, document: SnapshotDocument) {
        let capacity = self.capacity;
        self.channels = document
            .channels
            .into_iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, entries)| (key, ChannelLog::from_entries(entries, capacity)))
            .filter(|(_, log)| !log.is_empty())
            .collect();
        debug!(
            "history loaded: channels={} messages={}",
            self.channels.len(),
            self.total_messages()
        );
    }

    /// Copies the current state into a snapshot document.
    pub fn to_document(&self) -> SnapshotDocument {
        let channels: BTreeMap<String, Vec<String>> = self
            .channels
            .iter()
            .filter(|(_, log)| !log.is_empty())
            .map(|(key, log)| (key.clone(), log.to_vec()))
            .collect();
        SnapshotDocument::new(channels)
    }
}
