// ============================================================================
// Chat History Library
// ============================================================================
//
// Per-channel history of sent messages: a bounded in-memory log with
// deduplicated search, persisted as a single JSON snapshot that is written
// atomically by a periodic timer and a debounced timer.

pub mod config;
pub mod core;
pub mod facade;
pub mod prelude;
pub mod scheduler;
pub mod snapshot;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use config::HistoryConfig;
pub use core::{
    FlushReason, HistoryError, MAX_HISTORY_PER_CHANNEL, Result, SNAPSHOT_FORMAT_VERSION,
};
pub use facade::{
    ChatHistoryManager, FlushStats, HistoryQuery, HistorySource, LoadOutcome,
};
pub use scheduler::{Clock, ManualClock, TokioClock};
pub use snapshot::{SnapshotDocument, decode, encode};
pub use storage::DurableWriter;
pub use store::{AppendOutcome, HistoryStore};
