use std::sync::Arc;
use std::time::Duration;

use forge_core::{Job, ResourceLimits};
use forge_sandbox::{FakeBackend, RunOutcome};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::channel::FakeWorkerChannel;

fn test_context(backend: Arc<FakeBackend>, channel: Arc<FakeWorkerChannel>) -> ExecutorContext {
    let workspace_root = tempdir().unwrap();
    let path = workspace_root.path().to_path_buf();
    std::mem::forget(workspace_root);
    ExecutorContext {
        channel,
        backend,
        http: reqwest::Client::new(),
        file_service_base_url: "http://127.0.0.1:1/archives".to_string(),
        workspace_root: path,
        worker_id: "wkr-1".to_string(),
        limits: ResourceLimits::default(),
        cancel_poll_period: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn run_subcommands_continues_past_a_nonzero_exit_and_keeps_the_last_code() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_outcome(RunOutcome { stdout: "one\n".to_string(), exit_code: 1, ..Default::default() });
    backend.push_outcome(RunOutcome { stdout: "two\n".to_string(), exit_code: 0, ..Default::default() });
    let ctx = test_context(backend, Arc::new(FakeWorkerChannel::new()));
    let job = Job::builder().command("echo one\necho two").build();
    let dir = tempdir().unwrap();

    let (stdout, _stderr, exit_code) =
        run_subcommands(&ctx, &job, dir.path(), CancellationToken::new()).await.unwrap();

    assert_eq!(stdout, "one\ntwo\n");
    assert_eq!(exit_code, 0);
}

#[tokio::test]
async fn run_subcommands_stops_early_once_cancelled() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_outcome(RunOutcome { exit_code: 0, ..Default::default() });
    backend.push_outcome(RunOutcome { exit_code: 0, ..Default::default() });
    let ctx = test_context(backend.clone(), Arc::new(FakeWorkerChannel::new()));
    let job = Job::builder().command("first\nsecond").build();
    let dir = tempdir().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    run_subcommands(&ctx, &job, dir.path(), cancel).await.unwrap();

    assert_eq!(backend.requested_jobs().len(), 1);
}

#[tokio::test]
async fn submit_result_records_the_call_on_the_channel() {
    let channel = Arc::new(FakeWorkerChannel::new());
    let ctx = test_context(Arc::new(FakeBackend::new()), channel.clone());
    let job = Job::builder().command("echo hi").build();

    submit_result(&ctx, &job, "out".to_string(), "err".to_string(), 0).await.unwrap();

    assert_eq!(channel.calls().await, vec!["submit_result".to_string()]);
}

#[tokio::test]
async fn report_failure_records_the_call_on_the_channel() {
    let channel = Arc::new(FakeWorkerChannel::new());
    let ctx = test_context(Arc::new(FakeBackend::new()), channel.clone());
    let job = Job::builder().command("echo hi").build();

    report_failure(&ctx, &job, "boom".to_string()).await.unwrap();

    assert_eq!(channel.calls().await, vec!["report_failure".to_string()]);
}

#[tokio::test]
async fn cancel_poll_raises_the_token_once_the_channel_reports_a_pending_cancellation() {
    let channel = Arc::new(FakeWorkerChannel::new());
    channel.push_cancel(false).await;
    channel.push_cancel(true).await;
    let ctx = test_context(Arc::new(FakeBackend::new()), channel);
    let cancel = CancellationToken::new();

    let handle = spawn_cancel_poll(&ctx, "job-1", cancel.clone());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(cancel.is_cancelled());
    handle.abort();
}
