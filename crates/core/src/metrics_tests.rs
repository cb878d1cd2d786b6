// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn unknown_counter_reads_zero() {
    let m = Metrics::new();
    assert_eq!(m.get("nope"), 0);
}

#[test]
fn incr_accumulates() {
    let m = Metrics::new();
    m.incr(names::JOBS_ASSIGNED, 1);
    m.incr(names::JOBS_ASSIGNED, 2);
    assert_eq!(m.get(names::JOBS_ASSIGNED), 3);
}

#[test]
fn clone_shares_the_same_counters() {
    let m = Metrics::new();
    let m2 = m.clone();
    m.incr(names::SWEEPS_RUN, 1);
    assert_eq!(m2.get(names::SWEEPS_RUN), 1);
}

#[test]
fn snapshot_reflects_all_touched_counters() {
    let m = Metrics::new();
    m.incr(names::JOBS_FAILED, 1);
    m.incr(names::JOBS_COMPLETED, 5);
    let snap = m.snapshot();
    assert_eq!(snap.get(names::JOBS_FAILED), Some(&1));
    assert_eq!(snap.get(names::JOBS_COMPLETED), Some(&5));
}
