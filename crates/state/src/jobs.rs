// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-family event application.

use forge_core::job::OutputStream;
use forge_core::JobStatus;
use tracing::warn;

use crate::event::Event;
use crate::types::{MaterializedState, MAX_OUTPUT_BYTES};

pub fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobSubmitted { job } => {
            state.jobs.entry(job.id.0.clone()).or_insert_with(|| job.clone());
        }

        Event::JobAssigned { job_id, worker_id, now_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobAssigned for unknown job, dropping");
                return;
            };
            if job.assigned_agent_id.as_deref() == Some(worker_id.as_str()) {
                return; // already applied
            }
            job.assigned_agent_id = Some(worker_id.clone());
            job.assigned_at_ms = Some(*now_ms);
            job.status = JobStatus::Assigned;

            let (required_cpu, required_ram_mb) = (job.required_cpu, job.required_ram_mb);
            if let Some(worker) = state.workers.get_mut(worker_id) {
                if !worker.current_job_ids.iter().any(|id| id == job_id) {
                    worker.current_job_ids.push(job_id.clone());
                    worker.reserved_cpu += required_cpu;
                    worker.reserved_ram_mb += required_ram_mb;
                }
            }
        }

        Event::JobStarted { job_id, now_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobStarted for unknown job, dropping");
                return;
            };
            if job.status == JobStatus::Running {
                return;
            }
            job.status = JobStatus::Running;
            job.started_at_ms = Some(*now_ms);

            if let Some(worker_id) = job.assigned_agent_id.clone() {
                if let Some(worker) = state.workers.get_mut(&worker_id) {
                    worker.status = forge_core::WorkerStatus::Busy;
                }
            }
        }

        Event::JobOutputAppended { job_id, stream, chunk } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobOutputAppended for unknown job, dropping");
                return;
            };
            if job.status != JobStatus::Running {
                return;
            }
            let buf = match stream {
                OutputStream::Stdout => &mut job.stdout,
                OutputStream::Stderr => &mut job.stderr,
            };
            if buf.len() >= MAX_OUTPUT_BYTES {
                job.truncated = true;
                return;
            }
            let remaining = MAX_OUTPUT_BYTES - buf.len();
            if chunk.len() > remaining {
                buf.push_str(&chunk[..remaining]);
                job.truncated = true;
            } else {
                buf.push_str(chunk);
            }
        }

        Event::JobCompleted { job_id, stdout, stderr, exit_code, now_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobCompleted for unknown job, dropping");
                return;
            };
            if job.is_terminal() {
                return;
            }
            job.status = JobStatus::Completed;
            job.stdout = stdout.clone();
            job.stderr = stderr.clone();
            job.exit_code = Some(*exit_code);
            job.completed_at_ms = Some(*now_ms);
            release_reservation(state, job_id);
        }

        Event::JobFailed { job_id, error_message, now_ms, counts_as_attempt } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobFailed for unknown job, dropping");
                return;
            };
            if job.is_terminal() {
                return;
            }
            job.status = JobStatus::Failed;
            job.error_message = Some(error_message.clone());
            job.completed_at_ms = Some(*now_ms);
            if *counts_as_attempt {
                job.attempts += 1;
            }
            release_reservation(state, job_id);
        }

        Event::JobRequeued { job_id, now_ms } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobRequeued for unknown job, dropping");
                return;
            };
            if job.status == JobStatus::Queued {
                return;
            }
            release_reservation(state, job_id);
            let Some(job) = state.jobs.get_mut(job_id) else { return };
            job.status = JobStatus::Queued;
            job.assigned_agent_id = None;
            job.assigned_at_ms = None;
            job.started_at_ms = None;
            job.attempts += 1;
            job.queued_at_ms = *now_ms;
        }

        Event::JobCancelRequested { job_id } => {
            let Some(job) = state.jobs.get_mut(job_id) else {
                warn!(job_id, "JobCancelRequested for unknown job, dropping");
                return;
            };
            job.cancel_requested = true;
        }

        _ => unreachable!("non-job event routed to jobs::apply"),
    }
}

fn release_reservation(state: &mut MaterializedState, job_id: &str) {
    let Some(job) = state.jobs.get(job_id) else { return };
    let Some(worker_id) = job.assigned_agent_id.clone() else { return };
    let (required_cpu, required_ram_mb) = (job.required_cpu, job.required_ram_mb);
    if let Some(worker) = state.workers.get_mut(&worker_id) {
        if worker.current_job_ids.iter().any(|id| id == job_id) {
            worker.current_job_ids.retain(|id| id != job_id);
            worker.reserved_cpu = worker.reserved_cpu.saturating_sub(required_cpu);
            worker.reserved_ram_mb = worker.reserved_ram_mb.saturating_sub(required_ram_mb);
        }
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
