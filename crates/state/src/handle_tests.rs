// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::Job;

#[test]
fn lock_state_mut_then_lock_state_sees_the_write() {
    let handle = StateHandle::new(MaterializedState::new());
    let job = Job::builder().command("echo hi").build();
    let job_id = job.id.0.clone();

    handle.lock_state_mut(|state| {
        state.jobs.insert(job_id.clone(), job);
    });

    let seen = handle.lock_state(|state| state.job(&job_id).is_some());
    assert!(seen);
}

#[test]
fn clone_shares_the_same_underlying_state() {
    let handle = StateHandle::new(MaterializedState::new());
    let handle2 = handle.clone();

    handle.lock_state_mut(|state| {
        state.workers.insert("wkr-1".into(), forge_core::Worker::test_fixture("wkr-1"));
    });

    assert!(handle2.lock_state(|state| state.worker("wkr-1").is_some()));
}
