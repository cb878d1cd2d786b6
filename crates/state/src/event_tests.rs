// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::Job;

#[test]
fn apply_event_dispatches_job_submitted() {
    let mut state = MaterializedState::new();
    let job = Job::builder().command("echo hi").build();
    let job_id = job.id.0.clone();
    apply_event(&mut state, &Event::JobSubmitted { job });
    assert!(state.job(&job_id).is_some());
}

#[test]
fn event_roundtrips_through_json() {
    let job = Job::builder().command("echo hi").build();
    let event = Event::JobSubmitted { job };
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(event, back);
}
