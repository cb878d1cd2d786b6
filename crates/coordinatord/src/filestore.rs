// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A file-backed [`forge_state::StateStore`]: one JSON document map per
//! collection, written atomically (temp file + rename) so a crash mid-write
//! never leaves a half-written collection file behind. Grounded on the
//! teacher's snapshot persistence (`daemon/src/storage/snapshot.rs`'s
//! write-to-temp-then-rename durability pattern), simplified from a
//! versioned point-in-time snapshot to a per-collection document map since
//! `forge-coordinatord`'s own [`crate::wal::Wal`] is what startup actually
//! replays from — this store exists so the `StateStore` seam has a real
//! on-disk implementor, not just `InMemoryStateStore`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use forge_state::{StateError, StateStore};
use parking_lot::Mutex;
use serde_json::Value;

pub struct FileStateStore {
    dir: PathBuf,
    docs: Mutex<HashMap<(String, String), Value>>,
}

impl FileStateStore {
    /// Open (or create) a file-backed store rooted at `dir`, loading every
    /// `*.json` collection file found there.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StateError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| StateError::StoreWrite(e.to_string()))?;

        let mut docs = HashMap::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| StateError::StoreWrite(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| StateError::StoreWrite(e.to_string()))?;
            let path = entry.path();
            let Some(collection) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path).map_err(|e| StateError::StoreWrite(e.to_string()))?;
            let map: HashMap<String, Value> =
                serde_json::from_str(&contents).map_err(|e| StateError::StoreWrite(e.to_string()))?;
            for (key, doc) in map {
                docs.insert((collection.to_string(), key), doc);
            }
        }

        Ok(Self { dir, docs: Mutex::new(docs) })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    /// Rewrite one collection's file from the current in-memory map.
    /// Temp-file-then-rename keeps a reader from ever observing a partially
    /// written file.
    fn flush_collection(&self, collection: &str) -> Result<(), StateError> {
        let map: HashMap<&str, &Value> = self
            .docs
            .lock()
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, k), v)| (k.as_str(), v))
            .collect();
        let map: HashMap<String, &Value> = map.into_iter().map(|(k, v)| (k.to_string(), v)).collect();

        let contents = serde_json::to_vec_pretty(&map).map_err(|e| StateError::StoreWrite(e.to_string()))?;
        let final_path = self.collection_path(collection);
        let tmp_path = final_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).map_err(|e| StateError::StoreWrite(e.to_string()))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| StateError::StoreWrite(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn upsert(&self, collection: &str, key: &str, doc: Value) -> Result<(), StateError> {
        self.docs.lock().insert((collection.to_string(), key.to_string()), doc);
        self.flush_collection(collection)
    }

    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StateError> {
        Ok(self
            .docs
            .lock()
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|(_, v)| v.clone())
            .collect())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StateError> {
        self.docs.lock().remove(&(collection.to_string(), key.to_string()));
        self.flush_collection(collection)
    }
}

#[cfg(test)]
#[path = "filestore_tests.rs"]
mod tests;
