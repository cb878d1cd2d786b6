use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use forge_core::{FakeClock, Job, Metrics, Worker};
use forge_state::{MaterializedState, StateHandle};
use tokio_util::sync::CancellationToken;

use super::*;

fn handle_with_one_assignable_job() -> (StateHandle, String) {
    let mut state = MaterializedState::new();
    let worker = Worker::test_fixture("wkr-1");
    let job = Job::builder().command("echo hi").required_cpu(1).build();
    let job_id = job.id.0.clone();
    state.workers.insert(worker.id.0.clone(), worker);
    state.jobs.insert(job_id.clone(), job);
    (StateHandle::new(state), job_id)
}

#[tokio::test]
async fn sweep_once_assigns_and_invokes_event_sink() {
    let (state, job_id) = handle_with_one_assignable_job();
    let clock = FakeClock::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = Arc::clone(&seen);

    let scheduler = Scheduler::new(state.clone(), SchedulerConfig::default(), Metrics::new(), clock)
        .with_event_sink(Arc::new(move |_event| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        }));

    let report = scheduler.sweep_once();

    assert_eq!(report.jobs_assigned, 1);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    state.lock_state(|s| {
        assert_eq!(s.job(&job_id).unwrap().status, forge_core::JobStatus::Assigned);
    });
}

#[tokio::test(start_paused = true)]
async fn run_loop_sweeps_on_notify_and_stops_on_shutdown() {
    let (state, job_id) = handle_with_one_assignable_job();
    let clock = FakeClock::new();
    let mut config = SchedulerConfig::default();
    config.sweep_period_ms = 3_600_000; // long enough that only the notify wakes it

    let scheduler = Arc::new(Scheduler::new(state.clone(), config, Metrics::new(), clock));
    let notify = scheduler.notify_handle();
    let shutdown = CancellationToken::new();

    let run_scheduler = Arc::clone(&scheduler);
    let run_shutdown = shutdown.clone();
    let task = tokio::spawn(async move { run_scheduler.run(run_shutdown).await });

    notify.notify_one();
    tokio::time::sleep(Duration::from_millis(10)).await;

    state.lock_state(|s| {
        assert_eq!(s.job(&job_id).unwrap().status, forge_core::JobStatus::Assigned);
    });

    shutdown.cancel();
    task.await.unwrap();
}
