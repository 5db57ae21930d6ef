//! Application-facing API: lifecycle, mutation, and read-only queries.

pub mod flusher;
pub mod manager;
pub mod query;

pub use flusher::{FlushStats, SnapshotFlusher};
pub use manager::{ChatHistoryManager, LoadOutcome};
pub use query::{HistoryQuery, HistorySource, SharedStore};
