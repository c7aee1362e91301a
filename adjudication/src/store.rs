//! Append-only JSONL store for debate records.
//!
//! One JSON object per line; each append is a single write of the whole
//! line, so readers never observe a partial record.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::record::DebateRecord;

/// Error during a record append.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize debate record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to append debate record: {0}")]
    Io(#[from] std::io::Error),
}

/// A growing log of debate records, shared across runs.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line, creating parent directories and
    /// the file as needed.
    pub fn append(&self, record: &DebateRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!(path = %self.path.display(), id = %record.id, "appended debate record");
        Ok(())
    }
}
