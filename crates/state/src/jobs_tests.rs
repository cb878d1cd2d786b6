// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::{Job, JobStatus, Worker};

fn worker(id: &str) -> Worker {
    let mut w = Worker::test_fixture(id);
    w.cpu_count = 4;
    w.ram_total_mb = 4096;
    w
}

#[test]
fn assign_reserves_capacity_on_worker() {
    let mut state = MaterializedState::new();
    let w = worker("wkr-1");
    state.workers.insert(w.id.0.clone(), w);

    let job = Job::builder().command("echo hi").required_cpu(2).build();
    let job_id = job.id.0.clone();
    state.jobs.insert(job_id.clone(), job);

    apply(&mut state, &Event::JobAssigned { job_id: job_id.clone(), worker_id: "wkr-1".into(), now_ms: 10 });

    let worker = state.worker("wkr-1").unwrap();
    assert_eq!(worker.reserved_cpu, 2);
    assert!(worker.current_job_ids.contains(&job_id));
    assert_eq!(state.job(&job_id).unwrap().status, JobStatus::Assigned);
}

#[test]
fn assign_is_idempotent() {
    let mut state = MaterializedState::new();
    state.workers.insert("wkr-1".into(), worker("wkr-1"));
    let job = Job::builder().command("echo hi").required_cpu(1).build();
    let job_id = job.id.0.clone();
    state.jobs.insert(job_id.clone(), job);

    let event = Event::JobAssigned { job_id: job_id.clone(), worker_id: "wkr-1".into(), now_ms: 10 };
    apply(&mut state, &event);
    apply(&mut state, &event);

    assert_eq!(state.worker("wkr-1").unwrap().reserved_cpu, 1);
}

#[test]
fn completed_releases_reservation_and_is_terminal() {
    let mut state = MaterializedState::new();
    state.workers.insert("wkr-1".into(), worker("wkr-1"));
    let job = Job::builder().command("echo hi").required_cpu(1).build();
    let job_id = job.id.0.clone();
    state.jobs.insert(job_id.clone(), job);
    apply(&mut state, &Event::JobAssigned { job_id: job_id.clone(), worker_id: "wkr-1".into(), now_ms: 10 });
    apply(&mut state, &Event::JobStarted { job_id: job_id.clone(), now_ms: 11 });

    apply(
        &mut state,
        &Event::JobCompleted {
            job_id: job_id.clone(),
            stdout: "ok".into(),
            stderr: "".into(),
            exit_code: 0,
            now_ms: 20,
        },
    );

    let job = state.job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.is_terminal());
    assert_eq!(state.worker("wkr-1").unwrap().reserved_cpu, 0);
    assert!(state.worker("wkr-1").unwrap().current_job_ids.is_empty());
}

#[test]
fn mutations_after_terminal_are_dropped() {
    let mut state = MaterializedState::new();
    let job = Job::builder().command("echo hi").status(JobStatus::Completed).build();
    let job_id = job.id.0.clone();
    state.jobs.insert(job_id.clone(), job);

    apply(
        &mut state,
        &Event::JobFailed {
            job_id: job_id.clone(),
            error_message: "late".into(),
            now_ms: 99,
            counts_as_attempt: true,
        },
    );

    assert_eq!(state.job(&job_id).unwrap().status, JobStatus::Completed);
}

#[test]
fn output_append_truncates_at_cap() {
    let mut state = MaterializedState::new();
    let job = Job::builder().command("echo hi").status(JobStatus::Running).build();
    let job_id = job.id.0.clone();
    state.jobs.insert(job_id.clone(), job);

    let huge = "x".repeat(MAX_OUTPUT_BYTES + 10);
    apply(
        &mut state,
        &Event::JobOutputAppended {
            job_id: job_id.clone(),
            stream: forge_core::job::OutputStream::Stdout,
            chunk: huge,
        },
    );

    let job = state.job(&job_id).unwrap();
    assert_eq!(job.stdout.len(), MAX_OUTPUT_BYTES);
    assert!(job.truncated);
}

#[test]
fn requeue_increments_attempts_and_clears_assignment() {
    let mut state = MaterializedState::new();
    state.workers.insert("wkr-1".into(), worker("wkr-1"));
    let job = Job::builder().command("echo hi").required_cpu(1).build();
    let job_id = job.id.0.clone();
    state.jobs.insert(job_id.clone(), job);
    apply(&mut state, &Event::JobAssigned { job_id: job_id.clone(), worker_id: "wkr-1".into(), now_ms: 10 });

    apply(&mut state, &Event::JobRequeued { job_id: job_id.clone(), now_ms: 30 });

    let job = state.job(&job_id).unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.assigned_agent_id.is_none());
    assert_eq!(job.attempts, 1);
    assert_eq!(state.worker("wkr-1").unwrap().reserved_cpu, 0);
}
