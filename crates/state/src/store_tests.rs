// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[tokio::test]
async fn upsert_then_get_all_returns_the_document() {
    let store = InMemoryStateStore::new();
    store.upsert(JOBS_COLLECTION, "job-1", json!({"id": "job-1"})).await.unwrap();

    let all = store.get_all(JOBS_COLLECTION).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn collections_are_isolated() {
    let store = InMemoryStateStore::new();
    store.upsert(JOBS_COLLECTION, "job-1", json!({})).await.unwrap();
    store.upsert(WORKERS_COLLECTION, "wkr-1", json!({})).await.unwrap();

    assert_eq!(store.get_all(JOBS_COLLECTION).await.unwrap().len(), 1);
    assert_eq!(store.get_all(WORKERS_COLLECTION).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_the_document() {
    let store = InMemoryStateStore::new();
    store.upsert(JOBS_COLLECTION, "job-1", json!({})).await.unwrap();
    store.delete(JOBS_COLLECTION, "job-1").await.unwrap();
    assert!(store.get_all(JOBS_COLLECTION).await.unwrap().is_empty());
}
