pub mod error;
pub mod types;

pub use error::{HistoryError, Result};
pub use types::{
    DEFAULT_DEBOUNCE_INTERVAL, DEFAULT_FLUSH_INTERVAL, DEFAULT_SNAPSHOT_FILE_NAME,
    FlushReason, MAX_HISTORY_PER_CHANNEL, SNAPSHOT_FORMAT_VERSION,
};
