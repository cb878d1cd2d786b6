// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for crash recovery, internal to the coordinator.
//!
//! Grounded on the teacher's `oj-storage` snapshot/WAL split
//! (`daemon/src/storage/snapshot.rs`'s "snapshot plus replay" recovery
//! strategy): every committed [`Event`] is appended as one JSON line before
//! the request that produced it is acknowledged, and on startup the log is
//! replayed in order against an empty [`MaterializedState`] to rebuild it.
//! This is separate from the `StateStore` write-through collaborator (§6) —
//! the WAL never leaves the coordinator's own disk.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use forge_state::Event;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed wal entry: {0}")]
    Json(#[from] serde_json::Error),
}

/// An append-only log of [`Event`]s, one JSON object per line.
pub struct Wal {
    file: File,
}

impl Wal {
    /// Open (creating if absent) the log at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WalError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Append one event, flushing before returning so the caller's "durable
    /// before acknowledgment" requirement actually holds.
    pub fn append(&mut self, event: &Event) -> Result<(), WalError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }

    /// Replay every event recorded at `path`, in the order they were
    /// appended. Returns an empty vec if the file does not exist yet (first
    /// run).
    pub fn replay(path: impl AsRef<Path>) -> Result<Vec<Event>, WalError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }
        Ok(events)
    }

    pub fn path_for(data_dir: &Path) -> PathBuf {
        data_dir.join("coordinator.wal")
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
