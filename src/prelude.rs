//! Everything an embedding application usually needs.
//!
//! ```
//! use chathistory::prelude::*;
//!
//! let mut store = HistoryStore::new();
//! store.append("irc:#rust", "cargo build");
//! assert_eq!(store.get_messages("irc:#rust"), vec!["cargo build"]);
//! ```

pub use crate::config::HistoryConfig;
pub use crate::core::{HistoryError, Result};
pub use crate::facade::{ChatHistoryManager, HistoryQuery, HistorySource, LoadOutcome};
pub use crate::store::{AppendOutcome, HistoryStore};
