// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four-pass sweep (spec.md §4.4): health, timeouts, assignment, and a
//! no-op bookkeeping pass left for instrumentation. Runs as one critical
//! section under [`forge_state::StateHandle`]'s lock so the whole sweep is
//! atomic with respect to request handlers, matching §5's "scheduler
//! sweeps are mutually exclusive with handlers" guarantee.

use forge_core::metrics::names;
use forge_core::{JobStatus, Metrics, WorkerStatus};
use forge_state::{apply_event, Event, MaterializedState, StateHandle};
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::retry::{retry_decision, RetryDecision};
use crate::score::{is_candidate, pick_best};

/// Summary of one sweep, for logging and tests. `events` preserves
/// application order so a caller (e.g. `forge-coordinatord`'s persistence
/// worker) can write through each mutation in the order it happened.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub workers_marked_offline: u32,
    pub jobs_requeued: u32,
    pub jobs_failed: u32,
    pub jobs_assigned: u32,
    pub events: Vec<Event>,
}

/// Run one sweep against `state` at time `now_ms`. Synchronous and
/// side-effect-free beyond the state mutation and the returned report, so
/// it can be called directly from a `tokio::time::interval` tick or a
/// `Notify` wakeup without any `.await` inside the lock.
pub fn run_sweep(state: &StateHandle, now_ms: u64, config: &SchedulerConfig, metrics: &Metrics) -> SweepReport {
    let report = state.lock_state_mut(|s| {
        let mut report = SweepReport::default();
        pass_a_health(s, now_ms, config, &mut report);
        pass_b_timeouts(s, now_ms, &mut report);
        pass_c_assignment(s, now_ms, config, &mut report);
        report
    });

    metrics.incr(names::SWEEPS_RUN, 1);
    metrics.incr(names::WORKERS_MARKED_OFFLINE, report.workers_marked_offline as u64);
    metrics.incr(names::JOBS_REQUEUED, report.jobs_requeued as u64);
    metrics.incr(names::JOBS_FAILED, report.jobs_failed as u64);
    metrics.incr(names::JOBS_ASSIGNED, report.jobs_assigned as u64);

    debug!(
        workers_marked_offline = report.workers_marked_offline,
        jobs_requeued = report.jobs_requeued,
        jobs_failed = report.jobs_failed,
        jobs_assigned = report.jobs_assigned,
        "sweep complete"
    );

    report
}

fn apply_and_record(state: &mut MaterializedState, event: Event, report: &mut SweepReport) {
    apply_event(state, &event);
    report.events.push(event);
}

/// Apply the retry rule to one reclaimed job, given its attempts count
/// *before* this reclamation. Returns whether it was requeued or failed.
fn reclaim_job(state: &mut MaterializedState, job_id: &str, now_ms: u64, reason: &str, report: &mut SweepReport) {
    let Some(job) = state.jobs.get(job_id) else { return };
    if job.is_terminal() {
        return;
    }
    match retry_decision(job) {
        RetryDecision::Requeue => {
            apply_and_record(state, Event::JobRequeued { job_id: job_id.to_string(), now_ms }, report);
            report.jobs_requeued += 1;
        }
        RetryDecision::Fail => {
            apply_and_record(
                state,
                Event::JobFailed {
                    job_id: job_id.to_string(),
                    error_message: reason.to_string(),
                    now_ms,
                    counts_as_attempt: true,
                },
                report,
            );
            report.jobs_failed += 1;
        }
    }
}

fn pass_a_health(state: &mut MaterializedState, now_ms: u64, config: &SchedulerConfig, report: &mut SweepReport) {
    let worker_ids: Vec<String> = state.workers.keys().cloned().collect();
    for worker_id in worker_ids {
        let Some(worker) = state.workers.get(&worker_id) else { continue };
        let is_offline = worker.status == WorkerStatus::Offline;
        let stale = now_ms.saturating_sub(worker.last_heartbeat_ms) > config.heartbeat_timeout_ms;

        if !is_offline && stale {
            let job_ids = worker.current_job_ids.clone();
            apply_and_record(state, Event::WorkerMarkedOffline { worker_id: worker_id.clone() }, report);
            for job_id in job_ids {
                reclaim_job(state, &job_id, now_ms, "heartbeat_timeout", report);
            }
            report.workers_marked_offline += 1;
            continue;
        }

        if !is_offline {
            if let Some(until) = worker.cooldown_until_ms {
                if now_ms >= until {
                    apply_and_record(state, Event::WorkerCooldownCleared { worker_id: worker_id.clone() }, report);
                }
            }
        }
    }
}

fn pass_b_timeouts(state: &mut MaterializedState, now_ms: u64, report: &mut SweepReport) {
    let timed_out: Vec<String> = state
        .jobs
        .values()
        .filter(|j| {
            j.status == JobStatus::Running
                && j.started_at_ms.is_some_and(|started| now_ms.saturating_sub(started) > j.timeout_ms)
        })
        .map(|j| j.id.0.clone())
        .collect();

    for job_id in timed_out {
        reclaim_job(state, &job_id, now_ms, "job exceeded its timeout_ms deadline", report);
    }
}

fn pass_c_assignment(state: &mut MaterializedState, now_ms: u64, config: &SchedulerConfig, report: &mut SweepReport) {
    let mut queued: Vec<String> = state
        .jobs
        .values()
        .filter(|j| j.status == JobStatus::Queued)
        .map(|j| j.id.0.clone())
        .collect();
    queued.sort_by(|a, b| {
        let ja = &state.jobs[a];
        let jb = &state.jobs[b];
        ja.queued_at_ms.cmp(&jb.queued_at_ms).then_with(|| a.cmp(b))
    });

    for job_id in queued {
        let Some(job) = state.jobs.get(&job_id) else { continue };
        let job_snapshot = job.clone();
        let worker_id = {
            let candidates =
                state.workers.values().filter(|w| is_candidate(w, &job_snapshot, now_ms, config));
            pick_best(candidates, &job_snapshot).map(|w| w.id.0.clone())
        };
        let Some(worker_id) = worker_id else { continue };
        apply_and_record(state, Event::JobAssigned { job_id, worker_id, now_ms }, report);
        report.jobs_assigned += 1;
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
