//! Per-channel message logs and the query algorithm over them.

pub mod filter;
pub mod history;
pub mod channel_log;

pub use filter::filter_recent_unique;
pub use history::{AppendOutcome, HistoryStore};
pub use channel_log::ChannelLog;
