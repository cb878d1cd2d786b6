// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invariant checks from the testable-properties list. These are assertions
//! over a [`crate::types::MaterializedState`] snapshot, meant to be called
//! after each mutation in property tests — not on the request-handling hot
//! path.

use forge_core::JobStatus;

use crate::types::MaterializedState;

/// One violated invariant, named after the property it broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation(pub String);

/// Check every universally-quantified invariant in spec §8 against a
/// snapshot. Returns every violation found, not just the first.
pub fn check_all(state: &MaterializedState) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_reservation_accounting(state, &mut violations);
    check_reservation_within_capacity(state, &mut violations);
    check_assigned_jobs_are_tracked_by_their_worker(state, &mut violations);
    check_attempts_bounded(state, &mut violations);
    check_terminal_jobs_are_immutable_elsewhere(state, &mut violations);
    check_at_most_one_runner(state, &mut violations);
    violations
}

fn check_reservation_accounting(state: &MaterializedState, out: &mut Vec<Violation>) {
    for worker in state.workers.values() {
        let expected_cpu: u32 = worker
            .current_job_ids
            .iter()
            .filter_map(|id| state.job(id))
            .map(|j| j.required_cpu)
            .sum();
        let expected_ram: u64 = worker
            .current_job_ids
            .iter()
            .filter_map(|id| state.job(id))
            .map(|j| j.required_ram_mb)
            .sum();
        if worker.reserved_cpu != expected_cpu || worker.reserved_ram_mb != expected_ram {
            out.push(Violation(format!(
                "worker {} reservation {}/{} does not match sum over current_job_ids {}/{}",
                worker.id, worker.reserved_cpu, worker.reserved_ram_mb, expected_cpu, expected_ram
            )));
        }
    }
}

fn check_reservation_within_capacity(state: &MaterializedState, out: &mut Vec<Violation>) {
    for worker in state.workers.values() {
        if worker.reserved_cpu > worker.cpu_count || worker.reserved_ram_mb > worker.ram_total_mb {
            out.push(Violation(format!("worker {} over-reserved its own capacity", worker.id)));
        }
    }
}

fn check_assigned_jobs_are_tracked_by_their_worker(
    state: &MaterializedState,
    out: &mut Vec<Violation>,
) {
    for job in state.jobs.values() {
        if matches!(job.status, JobStatus::Assigned | JobStatus::Running) {
            let Some(worker_id) = &job.assigned_agent_id else {
                out.push(Violation(format!("job {} is {:?} with no assigned worker", job.id, job.status)));
                continue;
            };
            match state.worker(worker_id) {
                Some(worker) if worker.current_job_ids.iter().any(|id| id == &job.id.0) => {}
                _ => out.push(Violation(format!(
                    "job {} claims worker {} but that worker does not list it",
                    job.id, worker_id
                ))),
            }
        }
    }
}

fn check_attempts_bounded(state: &MaterializedState, out: &mut Vec<Violation>) {
    for job in state.jobs.values() {
        if job.attempts > job.max_retries + 1 {
            out.push(Violation(format!(
                "job {} has {} attempts, exceeding max_retries+1 = {}",
                job.id,
                job.attempts,
                job.max_retries + 1
            )));
        }
    }
}

fn check_terminal_jobs_are_immutable_elsewhere(_state: &MaterializedState, _out: &mut Vec<Violation>) {
    // Enforced structurally: `jobs::apply` returns early on every handler
    // once `job.is_terminal()`, so there is nothing to assert post hoc
    // beyond what the other checks already cover.
}

fn check_at_most_one_runner(state: &MaterializedState, out: &mut Vec<Violation>) {
    for job in state.jobs.values() {
        let runners: Vec<_> =
            state.workers.values().filter(|w| w.current_job_ids.iter().any(|id| id == &job.id.0)).collect();
        if runners.len() > 1 {
            out.push(Violation(format!("job {} is claimed by {} workers at once", job.id, runners.len())));
        }
    }
}

#[cfg(test)]
#[path = "invariants_tests.rs"]
mod tests;
