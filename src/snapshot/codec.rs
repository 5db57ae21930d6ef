//! JSON encoding of [`SnapshotDocument`].
//!
//! Layout: `{"version":1,"saved_at":"<rfc3339>","channels":{"<key>":["..."]}}`.
//! Unknown top-level fields are ignored on read.

use super::document::SnapshotDocument;
use crate::core::{HistoryError, Result, SNAPSHOT_FORMAT_VERSION};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Serialize)]
struct WireDocument<'a> {
    version: i64,
    saved_at: String,
    channels: &'a BTreeMap<String, Vec<String>>,
}

/// Serializes `document` as compact JSON.
///
/// A document without `saved_at` is stamped with the current time.
pub fn encode(document: &SnapshotDocument) -> Result<Vec<u8>> {
    let saved_at = document.saved_at.unwrap_or_else(Utc::now);
    let wire = WireDocument {
        version: SNAPSHOT_FORMAT_VERSION,
        saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        channels: &document.channels,
    };
    serde_json::to_vec(&wire)
        .map_err(|err| HistoryError::Format(format!("Failed to serialize snapshot: {}", err)))
}

/// Parses snapshot bytes.
///
/// Malformed JSON, a missing or non-integer `version`, and a missing or
/// non-object `channels` are format errors; any version other than the
/// current one is rejected as unsupported. Channel values that are not arrays
/// and entries that are not non-empty strings are dropped.
pub fn decode(bytes: &[u8]) -> Result<SnapshotDocument> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|err| HistoryError::Format(format!("Invalid snapshot JSON: {}", err)))?;
    let Value::Object(root) = root else {
        return Err(HistoryError::Format(
            "Snapshot root is not an object".to_string(),
        ));
    };

    check_version(&root)?;

    let channels = match root.get("channels") {
        Some(Value::Object(channels)) => channels,
        Some(_) => {
            return Err(HistoryError::Format(
                "Snapshot 'channels' is not an object".to_string(),
            ));
        }
        None => {
            return Err(HistoryError::Format(
                "Snapshot is missing 'channels'".to_string(),
            ));
        }
    };

    let mut decoded = BTreeMap::new();
    for (key, value) in channels {
        let Value::Array(items) = value else {
            debug!("snapshot channel '{}' is not an array, dropping", key);
            continue;
        };
        let entries: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect();
        let dropped = items.len() - entries.len();
        if dropped > 0 {
            debug!("snapshot channel '{}': dropped {} invalid entries", key, dropped);
        }
        decoded.insert(key.clone(), entries);
    }

    let saved_at = root
        .get("saved_at")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|stamp| stamp.with_timezone(&Utc));

    Ok(SnapshotDocument {
        channels: decoded,
        saved_at,
    })
}

/// JSON numbers carry no integer type, so `1.0` counts as `1`.
fn integral(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let number = value.as_f64()?;
    if number.fract() == 0.0 && number >= i64::MIN as f64 && number < i64::MAX as f64 {
        Some(number as i64)
    } else {
        None
    }
}

fn check_version(root: &Map<String, Value>) -> Result<()> {
    let version = match root.get("version") {
        Some(value) => integral(value).ok_or_else(|| {
            HistoryError::Format(format!("Snapshot version is not an integer: {}", value))
        })?,
        None => {
            return Err(HistoryError::Format(
                "Snapshot is missing 'version'".to_string(),
            ));
        }
    };
    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(HistoryError::UnsupportedVersion {
            found: version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }
    Ok(())
}
