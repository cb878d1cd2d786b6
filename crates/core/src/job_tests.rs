// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_queued_starts_in_queued_state() {
    let job = Job::new_queued("echo hi", "https://files/abc.zip", "input.zip", 1, 256, 300_000, 3, 1_000);
    assert_eq!(job.status, JobStatus::Queued);
    assert!(!job.is_terminal());
    assert_eq!(job.attempts, 0);
}

#[test]
fn terminal_statuses() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Queued.is_terminal());
    assert!(!JobStatus::Assigned.is_terminal());
    assert!(!JobStatus::Running.is_terminal());
}

#[test]
fn can_retry_until_attempts_reaches_max_retries() {
    let mut job = Job::builder().max_retries(3).attempts(2).build();
    assert!(job.can_retry());
    job.attempts = 3;
    assert!(!job.can_retry());
}

#[test]
fn job_id_display_roundtrips_through_string() {
    let id = JobId::new("job-abc123");
    assert_eq!(id.to_string(), "job-abc123");
    assert_eq!(id, "job-abc123");
}

#[test]
fn generated_ids_are_unique_and_prefixed() {
    let a = JobId::generate();
    let b = JobId::generate();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("job-"));
}

#[test]
fn builder_overrides_defaults() {
    let job = Job::builder()
        .command("sleep 1")
        .archive_ref("https://files/x.zip")
        .status(JobStatus::Running)
        .required_cpu(2)
        .build();
    assert_eq!(job.command, "sleep 1");
    assert_eq!(job.archive_ref, "https://files/x.zip");
    assert_eq!(job.status, JobStatus::Running);
    assert_eq!(job.required_cpu, 2);
}

#[test]
fn output_stream_display_matches_wire_tag() {
    assert_eq!(OutputStream::Stdout.to_string(), "stdout");
    assert_eq!(OutputStream::Stderr.to_string(), "stderr");
}
