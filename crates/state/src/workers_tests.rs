// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::{Job, JobStatus, Worker, WorkerStatus};

#[test]
fn register_inserts_new_worker() {
    let mut state = MaterializedState::new();
    let w = Worker::test_fixture("wkr-1");
    apply(&mut state, &Event::WorkerRegistered { worker: w });
    assert!(state.worker("wkr-1").is_some());
}

#[test]
fn re_register_clears_offline_status() {
    let mut state = MaterializedState::new();
    let mut w = Worker::test_fixture("wkr-1");
    w.status = WorkerStatus::Offline;
    state.workers.insert("wkr-1".into(), w);

    let fresh = Worker::test_fixture("wkr-1");
    apply(&mut state, &Event::WorkerRegistered { worker: fresh });

    assert_eq!(state.worker("wkr-1").unwrap().status, WorkerStatus::Idle);
}

#[test]
fn heartbeat_updates_telemetry() {
    let mut state = MaterializedState::new();
    state.workers.insert("wkr-1".into(), Worker::test_fixture("wkr-1"));

    apply(
        &mut state,
        &Event::WorkerHeartbeat {
            worker_id: "wkr-1".into(),
            cpu_usage: 55.0,
            ram_free_mb: 1000,
            ram_total_mb: 8192,
            status: "idle".into(),
            now_ms: 42,
        },
    );

    let w = state.worker("wkr-1").unwrap();
    assert_eq!(w.cpu_usage, 55.0);
    assert_eq!(w.last_heartbeat_ms, 42);
}

#[test]
fn heartbeat_on_offline_worker_with_stale_jobs_requeues_them() {
    let mut state = MaterializedState::new();
    let mut w = Worker::test_fixture("wkr-1");
    w.status = WorkerStatus::Offline;
    w.current_job_ids = vec!["job-1".to_string()];
    w.reserved_cpu = 1;
    state.workers.insert("wkr-1".into(), w);

    let mut job = Job::builder().command("echo hi").status(JobStatus::Running).build();
    job.id = forge_core::JobId::new("job-1");
    job.assigned_agent_id = Some("wkr-1".into());
    state.jobs.insert("job-1".into(), job);

    apply(
        &mut state,
        &Event::WorkerHeartbeat {
            worker_id: "wkr-1".into(),
            cpu_usage: 1.0,
            ram_free_mb: 100,
            ram_total_mb: 100,
            status: "idle".into(),
            now_ms: 1,
        },
    );

    let w = state.worker("wkr-1").unwrap();
    assert_eq!(w.status, WorkerStatus::Idle);
    assert!(w.current_job_ids.is_empty());
    assert_eq!(w.reserved_cpu, 0);

    let job = state.job("job-1").unwrap();
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.assigned_agent_id.is_none());
}

#[test]
fn mark_unhealthy_sets_cooldown_and_reason() {
    let mut state = MaterializedState::new();
    state.workers.insert("wkr-1".into(), Worker::test_fixture("wkr-1"));

    apply(
        &mut state,
        &Event::WorkerMarkedUnhealthy {
            worker_id: "wkr-1".into(),
            cooldown_until_ms: 5000,
            reason: "job failure".into(),
        },
    );

    let w = state.worker("wkr-1").unwrap();
    assert_eq!(w.status, WorkerStatus::Unhealthy);
    assert_eq!(w.cooldown_until_ms, Some(5000));
    assert_eq!(w.health_reason.as_deref(), Some("job failure"));
}
