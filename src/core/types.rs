use std::time::Duration;

/// Maximum number of messages retained per channel.
pub const MAX_HISTORY_PER_CHANNEL: usize = 5000;

/// The only snapshot document version this crate reads and writes.
pub const SNAPSHOT_FORMAT_VERSION: i64 = 1;

pub const DEFAULT_SNAPSHOT_FILE_NAME: &str = "chat-history.json";

pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

pub const DEFAULT_DEBOUNCE_INTERVAL: Duration = Duration::from_secs(5);

/// Which timer asked for a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlushReason {
    Periodic,
    Debounced,
    Shutdown,
    Manual,
}

impl FlushReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Periodic => "periodic",
            Self::Debounced => "debounced",
            Self::Shutdown => "shutdown",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for FlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortens message text for log lines.
pub(crate) fn preview(text: &str) -> String {
    const LIMIT: usize = 50;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
