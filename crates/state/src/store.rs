// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StateStore`: the document-store collaborator jobs/workers are written
//! through to. The core writes through on every mutation; on startup it
//! loads all documents and normalizes them (see [`crate::normalize`]).

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::StateError;

/// Document-store contract. A real backend (Postgres, SQLite, etc.) is a
/// drop-in implementor; no network-backed implementation ships here.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn upsert(&self, collection: &str, key: &str, doc: Value) -> Result<(), StateError>;
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StateError>;
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StateError>;
}

/// In-memory `StateStore` used by tests and the in-process integration
/// harness — no coordinator restart test exercises a real database.
#[derive(Default)]
pub struct InMemoryStateStore {
    docs: Mutex<HashMap<(String, String), Value>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn upsert(&self, collection: &str, key: &str, doc: Value) -> Result<(), StateError> {
        self.docs.lock().insert((collection.to_string(), key.to_string()), doc);
        Ok(())
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
        Ok(())
    }
}

pub const JOBS_COLLECTION: &str = "jobs";
pub const WORKERS_COLLECTION: &str = "workers";

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
