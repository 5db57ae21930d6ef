use std::collections::VecDeque;

/// Ordered log of one channel's entries, oldest first.
///
/// The log never holds two identical entries back to back and never grows
/// past the capacity it is given; eviction always removes from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelLog {
    entries: VecDeque<String>,
}

impl ChannelLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from stored entries, dropping blank text and repeated
    /// neighbours, then trimming to `capacity` from the front.
    pub fn from_entries<I>(entries: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut log = Self::new();
        for entry in entries {
            if entry.trim().is_empty() || log.last() == Some(entry.as_str()) {
                continue;
            }
            log.entries.push_back(entry);
        }
        log.evict_to(capacity);
        log
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    /// Appends `message` unless it equals the newest entry.
    ///
    /// Returns `None` when the message was a consecutive duplicate, otherwise
    /// the number of entries evicted to stay within `capacity`.
    pub fn push(&mut self, message: &str, capacity: usize) -> Option<usize> {
        if self.last() == Some(message) {
            return None;
        }
        self.entries.push_back(message.to_string());
        Some(self.evict_to(capacity))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    fn evict_to(&mut self, capacity: usize) -> usize {
        let excess = self.entries.len().saturating_sub(capacity);
        self.entries.drain(..excess);
        excess
    }
}
