// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator process bootstrap: open the data directory, recover
//! [`forge_state::MaterializedState`] from disk, and wire the scheduler and
//! `CoordinatorApi` to the same [`forge_state::StateHandle`] and
//! [`PersistHandle`].
//!
//! Recovery prefers the write-ahead log — it is the coordinator's own
//! authoritative replay source (spec.md §9's startup sequence, internal to
//! this crate) — and falls back to loading and normalizing whatever the
//! external `StateStore` holds only when the WAL is empty, e.g. a first run
//! against a `StateStore` seeded by a legacy system. Either way, `Pass A`'s
//! next sweep reconciles any cross-entity inconsistency the loaded snapshot
//! might carry (spec.md §9: "do not attempt to repair cross-entity
//! inconsistencies during load").

use std::sync::Arc;

use forge_core::{Metrics, SystemClock};
use forge_scheduler::Scheduler;
use forge_state::{
    apply_event, check_all, normalize, Event, JobOrWorkerRecord, MaterializedState, StateError,
    StateHandle, StateStore, JOBS_COLLECTION, WORKERS_COLLECTION,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{CoordinatorApi, CoordinatorService, JobDefaults};
use crate::config::Config;
use crate::filestore::FileStateStore;
use crate::persist::{self, PersistHandle, PersistTask};
use crate::wal::{Wal, WalError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to open coordinator file store: {0}")]
    Store(StateError),
    #[error("failed to read from the coordinator state store: {0}")]
    StoreRead(StateError),
    #[error("failed to replay write-ahead log: {0}")]
    Wal(#[from] WalError),
}

/// Everything a `main` needs to run the coordinator: the request-handling
/// surface and the scheduler loop, both already sharing one
/// [`StateHandle`].
pub struct Bootstrapped {
    pub api: Arc<CoordinatorService<SystemClock>>,
    pub scheduler: Scheduler<SystemClock>,
    pub persist_task: JoinHandle<()>,
}

/// Load or create the data directory at `config.data_dir`, recover state,
/// and assemble the coordinator's API and scheduler.
pub async fn bootstrap(config: &Config) -> Result<Bootstrapped, BootstrapError> {
    let store: Arc<dyn StateStore> =
        Arc::new(FileStateStore::open(config.data_dir.join("store")).map_err(BootstrapError::Store)?);

    let wal_path = config.wal_path();
    let wal_events = Wal::replay(&wal_path)?;

    let state = if wal_events.is_empty() {
        info!("no write-ahead log found, seeding state from the external StateStore");
        load_from_store(store.as_ref()).await?
    } else {
        info!(events = wal_events.len(), "replaying write-ahead log");
        let mut state = MaterializedState::new();
        for event in &wal_events {
            apply_event(&mut state, event);
        }
        state
    };

    for violation in check_all(&state) {
        warn!(violation = %violation.0, "state invariant violation found on startup; next sweep will reconcile it");
    }

    let state_handle = StateHandle::new(state);
    let metrics = Metrics::new();
    let (persist, persist_task) = persist::spawn(wal_path, store);

    let scheduler = build_scheduler(&state_handle, &config.scheduler_config(), &metrics, &persist);
    let scheduler_notify = scheduler.notify_handle();

    let job_defaults = JobDefaults {
        cpu: config.job_default_cpu,
        ram_mb: config.job_default_ram_mb,
        timeout_ms: config.job_default_timeout_ms,
        max_retries: config.job_default_max_retries,
    };
    let api = Arc::new(CoordinatorService::new(
        state_handle,
        persist,
        scheduler_notify,
        SystemClock,
        metrics,
        job_defaults,
        config.scheduler_cooldown_ms,
    ));

    Ok(Bootstrapped { api, scheduler, persist_task })
}

/// Wire a sweep's own events (worker marked offline, job requeued/failed/
/// assigned, etc.) back to the persistence worker, the scheduler's analogue
/// of `CoordinatorService::apply_and_persist`.
fn build_scheduler(
    state_handle: &StateHandle,
    scheduler_config: &forge_scheduler::SchedulerConfig,
    metrics: &Metrics,
    persist: &PersistHandle,
) -> Scheduler<SystemClock> {
    let sink_state = state_handle.clone();
    let sink_persist = persist.clone();
    Scheduler::new(state_handle.clone(), *scheduler_config, metrics.clone(), SystemClock).with_event_sink(
        Arc::new(move |event: &Event| {
            sink_persist.submit(PersistTask::for_event(&sink_state, event.clone()));
        }),
    )
}

async fn load_from_store(store: &dyn StateStore) -> Result<MaterializedState, BootstrapError> {
    let mut state = MaterializedState::new();

    for doc in store.get_all(JOBS_COLLECTION).await.map_err(BootstrapError::StoreRead)? {
        match normalize(doc) {
            Ok(JobOrWorkerRecord::Job(job)) => {
                state.jobs.insert(job.id.0.clone(), job);
            }
            Ok(JobOrWorkerRecord::Worker(worker)) => {
                warn!(worker_id = %worker.id, "jobs collection held a worker-shaped document, skipping");
            }
            Err(e) => warn!(error = %e, "failed to normalize a job document, skipping"),
        }
    }

    for doc in store.get_all(WORKERS_COLLECTION).await.map_err(BootstrapError::StoreRead)? {
        match normalize(doc) {
            Ok(JobOrWorkerRecord::Worker(worker)) => {
                state.workers.insert(worker.id.0.clone(), worker);
            }
            Ok(JobOrWorkerRecord::Job(job)) => {
                warn!(job_id = %job.id, "workers collection held a job-shaped document, skipping");
            }
            Err(e) => warn!(error = %e, "failed to normalize a worker document, skipping"),
        }
    }

    Ok(state)
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
