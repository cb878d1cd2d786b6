// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-family event application.

use forge_core::WorkerStatus;
use tracing::warn;

use crate::event::Event;
use crate::types::MaterializedState;

pub fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::WorkerRegistered { worker } => {
            match state.workers.get_mut(&worker.id.0) {
                Some(existing) => {
                    // Upsert semantics (spec RegisterWorker): re-registration
                    // updates capacity and clears OFFLINE.
                    existing.hostname = worker.hostname.clone();
                    existing.os = worker.os.clone();
                    existing.cpu_count = worker.cpu_count;
                    existing.cpu_usage = worker.cpu_usage;
                    existing.ram_total_mb = worker.ram_total_mb;
                    existing.ram_free_mb = worker.ram_free_mb;
                    existing.version = worker.version.clone();
                    if existing.status == WorkerStatus::Offline {
                        existing.status = WorkerStatus::Idle;
                    }
                }
                None => {
                    state.workers.insert(worker.id.0.clone(), worker.clone());
                }
            }
        }

        Event::WorkerHeartbeat { worker_id, cpu_usage, ram_free_mb, ram_total_mb, status, now_ms } => {
            let Some(worker) = state.workers.get_mut(worker_id) else {
                warn!(worker_id, "heartbeat for unknown worker, dropping");
                return;
            };
            worker.cpu_usage = *cpu_usage;
            worker.ram_free_mb = *ram_free_mb;
            worker.ram_total_mb = *ram_total_mb;
            worker.last_heartbeat_ms = *now_ms;
            let _ = status; // reported status is informational; derived status below wins

            if worker.status == WorkerStatus::Offline {
                if worker.current_job_ids.is_empty() {
                    worker.status = WorkerStatus::Idle;
                } else {
                    // Prior inconsistency: OFFLINE worker claims in-flight jobs.
                    // Clear and let the scheduler requeue them.
                    let stale: Vec<String> = std::mem::take(&mut worker.current_job_ids);
                    worker.reserved_cpu = 0;
                    worker.reserved_ram_mb = 0;
                    worker.status = WorkerStatus::Idle;
                    drop(worker);
                    for job_id in stale {
                        if let Some(job) = state.jobs.get_mut(&job_id) {
                            job.assigned_agent_id = None;
                            job.assigned_at_ms = None;
                            job.started_at_ms = None;
                            job.status = forge_core::JobStatus::Queued;
                            job.attempts += 1;
                        }
                    }
                }
            }
        }

        Event::WorkerMarkedOffline { worker_id } => {
            let Some(worker) = state.workers.get_mut(worker_id) else {
                warn!(worker_id, "mark-offline for unknown worker, dropping");
                return;
            };
            worker.status = WorkerStatus::Offline;
        }

        Event::WorkerMarkedUnhealthy { worker_id, cooldown_until_ms, reason } => {
            let Some(worker) = state.workers.get_mut(worker_id) else {
                warn!(worker_id, "mark-unhealthy for unknown worker, dropping");
                return;
            };
            worker.status = WorkerStatus::Unhealthy;
            worker.cooldown_until_ms = Some(*cooldown_until_ms);
            worker.health_reason = Some(reason.clone());
        }

        Event::WorkerCooldownCleared { worker_id } => {
            let Some(worker) = state.workers.get_mut(worker_id) else {
                warn!(worker_id, "cooldown-clear for unknown worker, dropping");
                return;
            };
            if worker.status != WorkerStatus::Unhealthy {
                return;
            }
            worker.status = WorkerStatus::Idle;
            worker.cooldown_until_ms = None;
            worker.health_reason = None;
        }

        _ => unreachable!("non-worker event routed to workers::apply"),
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
