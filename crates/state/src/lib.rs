// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! forge-state: the materialized job/worker state and its event log.
//!
//! This crate owns the single process-wide mutex every handler and the
//! scheduler contend on ([`StateHandle`]), the event vocabulary mutations go
//! through ([`Event`] / [`apply_event`]), and the `StateStore` write-through
//! contract plus legacy-data normalization.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod error;
pub mod event;
mod handle;
mod invariants;
mod jobs;
pub mod normalize;
pub mod store;
pub mod types;
mod workers;

pub use error::{NormalizeError, StateError};
pub use event::{apply_event, Event};
pub use handle::StateHandle;
pub use invariants::{check_all, Violation};
pub use normalize::{normalize, JobOrWorkerRecord};
pub use store::{InMemoryStateStore, StateStore, JOBS_COLLECTION, WORKERS_COLLECTION};
pub use types::{MaterializedState, MAX_OUTPUT_BYTES};
