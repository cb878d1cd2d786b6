// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use forge_core::Job;

#[test]
fn new_state_is_empty() {
    let state = MaterializedState::new();
    assert!(state.jobs.is_empty());
    assert!(state.workers.is_empty());
}

#[test]
fn jobs_for_worker_filters_by_assignment() {
    let mut state = MaterializedState::new();
    let mut j1 = Job::builder().command("a").build();
    j1.assigned_agent_id = Some("wkr-1".to_string());
    let mut j2 = Job::builder().command("b").build();
    j2.assigned_agent_id = Some("wkr-2".to_string());
    state.jobs.insert(j1.id.0.clone(), j1);
    state.jobs.insert(j2.id.0.clone(), j2);

    let for_worker: Vec<_> = state.jobs_for_worker("wkr-1").collect();
    assert_eq!(for_worker.len(), 1);
    assert_eq!(for_worker[0].assigned_agent_id.as_deref(), Some("wkr-1"));
}
