//! Crash-safe replacement of the snapshot file.
//!
//! The payload is written to a temporary file in the target's directory,
//! synced, and renamed over the target, so readers only ever see the previous
//! snapshot or the new one.

use crate::core::{HistoryError, Result};
use log::{debug, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct DurableWriter {
    path: PathBuf,
}

impl DurableWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Atomically replaces the file with `bytes`.
    ///
    /// On failure the previously committed file, if any, is left as it was.
    pub fn commit(&self, bytes: &[u8]) -> Result<()> {
        let result = commit(&self.path, bytes);
        if let Err(err) = &result {
            warn!("snapshot commit failed: path='{}' error='{}'", self.path.display(), err);
        }
        result
    }

    /// Reads the whole file; `Ok(None)` when it does not exist yet.
    pub fn load(&self) -> Result<Option<Vec<u8>>> {
        load(&self.path)
    }
}

pub fn commit(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| {
        HistoryError::Io(format!(
            "Failed to create snapshot directory '{}': {}",
            parent.display(),
            err
        ))
    })?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|err| {
        HistoryError::Io(format!(
            "Failed to create temp file in '{}': {}",
            parent.display(),
            err
        ))
    })?;
    temp.write_all(bytes).map_err(|err| {
        HistoryError::Io(format!(
            "Failed to write temp file '{}': {}",
            temp.path().display(),
            err
        ))
    })?;
    temp.as_file().sync_all().map_err(|err| {
        HistoryError::Io(format!(
            "Failed to sync temp file '{}': {}",
            temp.path().display(),
            err
        ))
    })?;

    temp.persist(path).map_err(|err| {
        HistoryError::Io(format!(
            "Failed to replace '{}': {}",
            path.display(),
            err.error
        ))
    })?;
    debug!("snapshot committed: path='{}' bytes={}", path.display(), bytes.len());
    Ok(())
}

pub fn load(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(HistoryError::Io(format!(
            "Failed to read snapshot '{}': {}",
            path.display(),
            err
        ))),
    }
}
