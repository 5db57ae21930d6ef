use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// The whole history at one instant, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDocument {
    /// Channel key to entries, oldest first.
    pub channels: BTreeMap<String, Vec<String>>,
    /// When the document was written, if the file recorded it.
    pub saved_at: Option<DateTime<Utc>>,
}

impl SnapshotDocument {
    pub fn new(channels: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            channels,
            saved_at: None,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn message_count(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }
}
