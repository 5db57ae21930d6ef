//! Versioned on-disk representation of the history store.

pub mod codec;
pub mod document;

pub use codec::{decode, encode};
pub use document::SnapshotDocument;
