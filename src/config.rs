use crate::core::{
    DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_FLUSH_INTERVAL, DEFAULT_SNAPSHOT_FILE_NAME, HistoryError,
    MAX_HISTORY_PER_CHANNEL, Result,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// History store configuration
///
/// The surrounding application resolves `directory`; everything else has a
/// default matching the stock behaviour.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Directory that holds the snapshot file
    pub directory: PathBuf,

    /// Snapshot file name inside `directory`
    pub file_name: String,

    /// Maximum entries kept per channel
    pub max_per_channel: usize,

    /// Period of the unconditional flush
    pub flush_interval: Duration,

    /// Quiet period after the last append before a debounced flush
    pub debounce_interval: Duration,
}

impl HistoryConfig {
    /// Create a configuration rooted at `directory`
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            file_name: DEFAULT_SNAPSHOT_FILE_NAME.to_string(),
            max_per_channel: MAX_HISTORY_PER_CHANNEL,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            debounce_interval: DEFAULT_DEBOUNCE_INTERVAL,
        }
    }

    /// Set the snapshot file name
    pub fn file_name(mut self, file_name: &str) -> Self {
        self.file_name = file_name.to_string();
        self
    }

    /// Set the per-channel capacity
    pub fn max_per_channel(mut self, max: usize) -> Self {
        self.max_per_channel = max;
        self
    }

    /// Set the periodic flush interval
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Set the debounce interval
    pub fn debounce_interval(mut self, interval: Duration) -> Self {
        self.debounce_interval = interval;
        self
    }

    /// Full path of the snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.file_name.trim().is_empty() {
            return Err(HistoryError::InvalidConfig(
                "file_name must not be empty".to_string(),
            ));
        }
        if self.max_per_channel == 0 {
            return Err(HistoryError::InvalidConfig(
                "max_per_channel must be at least 1".to_string(),
            ));
        }
        if self.flush_interval.is_zero() {
            return Err(HistoryError::InvalidConfig(
                "flush_interval must be non-zero".to_string(),
            ));
        }
        if self.debounce_interval.is_zero() {
            return Err(HistoryError::InvalidConfig(
                "debounce_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
