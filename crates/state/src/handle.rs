// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single process-wide mutex around the materialized state.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::MaterializedState;

/// Shared handle to the materialized state, cloned into every
/// request-handler task and the scheduler task.
///
/// Lock critical sections must stay synchronous and non-blocking — copy
/// data out before doing any I/O, never hold the lock across an `.await`.
#[derive(Clone, Default)]
pub struct StateHandle(Arc<Mutex<MaterializedState>>);

impl StateHandle {
    pub fn new(state: MaterializedState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// Run `f` with shared read access to the state, returning its result.
    pub fn lock_state<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        let guard = self.0.lock();
        f(&guard)
    }

    /// Run `f` with exclusive mutable access to the state, returning its
    /// result.
    pub fn lock_state_mut<R>(&self, f: impl FnOnce(&mut MaterializedState) -> R) -> R {
        let mut guard = self.0.lock();
        f(&mut guard)
    }
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
