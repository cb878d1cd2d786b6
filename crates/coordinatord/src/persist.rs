// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistence worker: drains a channel of committed mutations, appends
//! each event to the [`crate::wal::Wal`] and write-throughs the affected
//! record to the external [`forge_state::StateStore`].
//!
//! Persistence writes are fire-and-forget from the mutation path but
//! ordered per key: the mutation point enqueues a snapshot and a
//! persistence worker drains the queue. API handlers and the scheduler
//! hand off work here instead of writing through under the state lock.

use std::path::PathBuf;
use std::sync::Arc;

use forge_core::{Job, Worker};
use forge_state::{Event, StateHandle, StateStore, JOBS_COLLECTION, WORKERS_COLLECTION};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::error;

use crate::wal::Wal;

/// One unit of work for the persistence worker: the event that justifies a
/// WAL entry, plus the up-to-date record(s) it should write through.
pub struct PersistTask {
    pub event: Event,
    pub job: Option<Job>,
    pub worker: Option<Worker>,
}

impl PersistTask {
    /// Build a task for an event produced outside `CoordinatorApi` (i.e. by
    /// a scheduler sweep), looking the affected job/worker back up from
    /// `state` so the write-through half of the task has something current
    /// to send, the same way each `CoordinatorApi` handler does inline.
    pub fn for_event(state: &StateHandle, event: Event) -> Self {
        let (job, worker) = match &event {
            Event::JobSubmitted { job } => (Some(job.clone()), None),
            Event::JobAssigned { job_id, .. }
            | Event::JobStarted { job_id, .. }
            | Event::JobOutputAppended { job_id, .. }
            | Event::JobCompleted { job_id, .. }
            | Event::JobFailed { job_id, .. }
            | Event::JobRequeued { job_id, .. }
            | Event::JobCancelRequested { job_id } => {
                (state.lock_state(|s| s.job(job_id).cloned()), None)
            }
            Event::WorkerRegistered { worker } => (None, Some(worker.clone())),
            Event::WorkerHeartbeat { worker_id, .. }
            | Event::WorkerMarkedOffline { worker_id }
            | Event::WorkerMarkedUnhealthy { worker_id, .. }
            | Event::WorkerCooldownCleared { worker_id } => {
                (None, state.lock_state(|s| s.worker(worker_id).cloned()))
            }
        };
        Self { event, job, worker }
    }
}

/// Handle callers use to hand off committed mutations.
#[derive(Clone)]
pub struct PersistHandle {
    tx: UnboundedSender<PersistTask>,
}

impl PersistHandle {
    pub fn submit(&self, task: PersistTask) {
        // The receiver only goes away when the worker task itself is
        // dropped (coordinator shutdown); there is nothing a caller could
        // do differently in that case, so the error is dropped.
        let _ = self.tx.send(task);
    }
}

/// Spawn the background worker and return a handle plus its `JoinHandle`.
pub fn spawn(wal_path: PathBuf, store: Arc<dyn StateStore>) -> (PersistHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run(wal_path, store, rx));
    (PersistHandle { tx }, handle)
}

async fn run(wal_path: PathBuf, store: Arc<dyn StateStore>, mut rx: UnboundedReceiver<PersistTask>) {
    let mut wal = match Wal::open(&wal_path) {
        Ok(wal) => wal,
        Err(e) => {
            error!(error = %e, path = %wal_path.display(), "failed to open WAL, persistence worker exiting");
            return;
        }
    };

    while let Some(task) = rx.recv().await {
        if let Err(e) = wal.append(&task.event) {
            error!(error = %e, "WAL append failed");
        }

        if let Some(job) = &task.job {
            if let Err(e) = write_through_job(store.as_ref(), job).await {
                error!(error = %e, job_id = %job.id, "StateStore write-through failed for job");
            }
        }
        if let Some(worker) = &task.worker {
            if let Err(e) = write_through_worker(store.as_ref(), worker).await {
                error!(error = %e, worker_id = %worker.id, "StateStore write-through failed for worker");
            }
        }
    }
}

async fn write_through_job(store: &dyn StateStore, job: &Job) -> Result<(), forge_state::StateError> {
    let doc = serde_json::to_value(job).map_err(|e| forge_state::StateError::StoreWrite(e.to_string()))?;
    store.upsert(JOBS_COLLECTION, &job.id.0, doc).await
}

async fn write_through_worker(store: &dyn StateStore, worker: &Worker) -> Result<(), forge_state::StateError> {
    let doc = serde_json::to_value(worker).map_err(|e| forge_state::StateError::StoreWrite(e.to_string()))?;
    store.upsert(WORKERS_COLLECTION, &worker.id.0, doc).await
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
