// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use forge_core::ResourceLimits;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::*;

fn request(job_id: &str) -> RunRequest {
    RunRequest {
        job_id: job_id.to_string(),
        command: "echo hi".to_string(),
        workspace_dir: PathBuf::from("/tmp/ws"),
        image: "alpine:3.20".to_string(),
        limits: ResourceLimits::default(),
        deadline: Instant::now() + std::time::Duration::from_secs(10),
    }
}

#[tokio::test]
async fn returns_queued_outcome_in_order() {
    let backend = FakeBackend::new();
    backend.push_outcome(RunOutcome { exit_code: 0, stdout: "first".into(), ..Default::default() });
    backend.push_outcome(RunOutcome { exit_code: 1, stdout: "second".into(), ..Default::default() });

    let (tx, _rx) = mpsc::unbounded_channel();
    let first = backend.run(request("job-1"), CancellationToken::new(), tx.clone()).await.unwrap();
    let second = backend.run(request("job-2"), CancellationToken::new(), tx).await.unwrap();

    assert_eq!(first.stdout, "first");
    assert_eq!(second.stdout, "second");
    assert_eq!(second.exit_code, 1);
}

#[tokio::test]
async fn empty_queue_defaults_to_a_clean_exit() {
    let backend = FakeBackend::new();
    let (tx, _rx) = mpsc::unbounded_channel();
    let outcome = backend.run(request("job-1"), CancellationToken::new(), tx).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
}

#[tokio::test]
async fn pushed_error_surfaces_as_spawn_failed() {
    let backend = FakeBackend::new();
    backend.push_error("image missing");
    let (tx, _rx) = mpsc::unbounded_channel();
    let err = backend.run(request("job-1"), CancellationToken::new(), tx).await.unwrap_err();
    assert!(matches!(err, SandboxError::SpawnFailed(msg) if msg == "image missing"));
}

#[tokio::test]
async fn already_cancelled_token_short_circuits_to_cancelled_outcome() {
    let backend = FakeBackend::new();
    backend.push_outcome(RunOutcome { exit_code: 0, ..Default::default() });
    let token = CancellationToken::new();
    token.cancel();

    let (tx, _rx) = mpsc::unbounded_channel();
    let outcome = backend.run(request("job-1"), token, tx).await.unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.exit_code, 130);
}

#[tokio::test]
async fn records_every_request_it_served() {
    let backend = FakeBackend::new();
    backend.push_outcome(RunOutcome::default());
    backend.push_outcome(RunOutcome::default());
    let (tx, _rx) = mpsc::unbounded_channel();
    backend.run(request("job-a"), CancellationToken::new(), tx.clone()).await.unwrap();
    backend.run(request("job-b"), CancellationToken::new(), tx).await.unwrap();

    assert_eq!(backend.requested_jobs(), vec!["job-a".to_string(), "job-b".to_string()]);
}
