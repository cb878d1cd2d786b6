// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pass C candidate filter and resource-fit scoring (spec.md §4.4).

use forge_core::{Job, Worker, WorkerStatus};

use crate::config::SchedulerConfig;

/// True iff `worker` may be assigned `job` right now.
///
/// Does not check the worker's strict parallelism cap `P` — the worker
/// itself enforces that by refusing further claims (spec.md §4.4's closing
/// note); the 90%-CPU rule and the reservation bounds below approximate it
/// from the coordinator's side.
pub fn is_candidate(worker: &Worker, job: &Job, now_ms: u64, config: &SchedulerConfig) -> bool {
    matches!(worker.status, WorkerStatus::Idle | WorkerStatus::Busy)
        && !worker.in_cooldown(now_ms)
        && worker.has_capacity_for(job.required_cpu, job.required_ram_mb)
        && worker.cpu_usage < config.candidate_cpu_usage_ceiling
}

/// Lower-is-better placement score for assigning `job` onto `worker`,
/// computed as though the job were already reserved (spec.md §4.4 formula).
pub fn score_candidate(worker: &Worker, job: &Job) -> f64 {
    let cpu_after = worker.reserved_cpu + job.required_cpu;
    let ram_after = worker.reserved_ram_mb + job.required_ram_mb;

    let cpu_term = if worker.cpu_count == 0 { 100.0 } else { 100.0 * cpu_after as f64 / worker.cpu_count as f64 };
    let ram_term =
        if worker.ram_total_mb == 0 { 100.0 } else { 100.0 * ram_after as f64 / worker.ram_total_mb as f64 };

    0.6 * worker.cpu_usage + 0.3 * cpu_term + 0.1 * ram_term
}

/// Pick the best candidate worker for `job`: lowest score, ties broken by
/// earliest `registered_at_ms`.
pub fn pick_best<'a>(candidates: impl Iterator<Item = &'a Worker>, job: &Job) -> Option<&'a Worker> {
    candidates
        .map(|w| (score_candidate(w, job), w))
        .min_by(|(score_a, a), (score_b, b)| {
            score_a
                .partial_cmp(score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.registered_at_ms.cmp(&b.registered_at_ms))
        })
        .map(|(_, w)| w)
}

#[cfg(test)]
#[path = "score_tests.rs"]
mod tests;
