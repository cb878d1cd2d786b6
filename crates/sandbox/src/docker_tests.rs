// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use forge_core::ResourceLimits;
use tokio::time::Instant;

use super::*;

fn sample_request() -> RunRequest {
    RunRequest {
        job_id: "job-abc".to_string(),
        command: "python run.py".to_string(),
        workspace_dir: PathBuf::from("/var/lib/forge-agent/workspaces/job-abc"),
        image: "python:3.12-slim".to_string(),
        limits: ResourceLimits::default(),
        deadline: Instant::now() + Duration::from_secs(300),
    }
}

#[test]
fn container_name_is_scoped_to_the_job_and_unique() {
    let a = container_name("job-abc");
    let b = container_name("job-abc");
    assert!(a.starts_with("forge-job-abc-"));
    assert_ne!(a, b, "each spawn should get a unique container name to avoid collisions");
}

#[test]
fn run_args_apply_every_isolation_control() {
    let req = sample_request();
    let args = build_run_args("forge-job-abc-xyz", &req);

    for expected in [
        "--read-only",
        "--network",
        "none",
        "--cap-drop",
        "ALL",
        "--security-opt",
        "no-new-privileges",
        "--pids-limit",
        "-w",
        "/workspace",
    ] {
        assert!(args.iter().any(|a| a == expected), "missing isolation flag: {expected}");
    }
}

#[test]
fn run_args_mount_the_workspace_and_pick_the_shell_entrypoint() {
    let req = sample_request();
    let args = build_run_args("forge-job-abc-xyz", &req);

    assert!(args.iter().any(|a| a.contains("/var/lib/forge-agent/workspaces/job-abc:/workspace:rw")));
    let tail = &args[args.len() - 3..];
    assert_eq!(tail, &["sh".to_string(), "-c".to_string(), "python run.py".to_string()]);
}

#[test]
fn run_args_disable_swap_by_matching_memory_cap() {
    let req = sample_request();
    let args = build_run_args("c", &req);
    let memory_idx = args.iter().position(|a| a == "--memory").unwrap();
    let swap_idx = args.iter().position(|a| a == "--memory-swap").unwrap();
    assert_eq!(args[memory_idx + 1], args[swap_idx + 1]);
}
