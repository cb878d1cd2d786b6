// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy-data normalization, applied once per record on `StateStore::get_all`
//! load. Mirrors the coordinator startup sequence's snapshot-then-replay
//! pass, but adapted to the spec's flat-document store rather than an
//! event log external to the coordinator.

use forge_core::{Job, Worker};
use serde_json::{Map, Value};

use crate::error::NormalizeError;

/// Bytes per MB, for the legacy byte-valued RAM fields (spec.md §9).
const BYTES_PER_MB: u64 = 1_048_576;

/// Upper bound on a value that could plausibly already be megabytes. A real
/// document in bytes is many orders of magnitude past this; anything below
/// it is left alone.
const PLAUSIBLE_MAX_RAM_MB: u64 = 10_000_000;

/// A normalized record loaded from the `StateStore`, ready to be inserted
/// into a fresh [`crate::types::MaterializedState`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobOrWorkerRecord {
    Job(Job),
    Worker(Worker),
}

/// Normalize one raw document into a typed record.
///
/// Older documents may be missing fields added by later schema revisions
/// (e.g. `truncated`, `attempts`) — `serde`'s `#[serde(default)]` handles
/// those. This function's job is the cases serde defaults can't cover: a
/// record that is shaped like a job but predates the `required_cpu`/
/// `required_ram_mb` split, or carries a status string serde no longer
/// recognizes.
pub fn normalize(mut raw: Value) -> Result<JobOrWorkerRecord, NormalizeError> {
    let obj = raw.as_object_mut().ok_or_else(|| {
        NormalizeError::UnrecognizedShape("document root is not an object".to_string())
    })?;

    // Legacy job documents stored a single `resources: {cpu, ram_mb}` object
    // instead of flat `required_cpu`/`required_ram_mb` fields.
    if let Some(resources) = obj.remove("resources") {
        if let Some(cpu) = resources.get("cpu") {
            obj.entry("required_cpu").or_insert(cpu.clone());
        }
        if let Some(ram_mb) = resources.get("ram_mb") {
            obj.entry("required_ram_mb").or_insert(ram_mb.clone());
        }
    }

    // Legacy job documents used `error` instead of `error_message`.
    if let Some(error) = obj.remove("error") {
        obj.entry("error_message").or_insert(error);
    }

    // Legacy job documents used `workerId` instead of `assigned_agent_id`.
    if let Some(worker_id) = obj.remove("workerId") {
        obj.entry("assigned_agent_id").or_insert(worker_id);
    }

    // Legacy job documents spelled the queued state `pending`; every other
    // legacy status string already matches the current snake_case wire form.
    if obj.get("status").and_then(Value::as_str) == Some("pending") {
        obj.insert("status".to_string(), Value::String("queued".to_string()));
    }

    // Legacy documents recorded RAM fields in bytes rather than MB.
    rescale_ram_field(obj, "required_ram_mb");
    rescale_ram_field(obj, "ram_total_mb");
    rescale_ram_field(obj, "ram_free_mb");

    if obj.contains_key("command") {
        let job: Job = serde_json::from_value(raw)?;
        return Ok(JobOrWorkerRecord::Job(job));
    }
    if obj.contains_key("hostname") {
        let worker: Worker = serde_json::from_value(raw)?;
        return Ok(JobOrWorkerRecord::Worker(worker));
    }

    Err(NormalizeError::UnrecognizedShape(format!(
        "document has neither a 'command' nor 'hostname' field: {:?}",
        obj.keys().collect::<Vec<_>>()
    )))
}

/// Divide `field` by [`BYTES_PER_MB`] in place when its current value is too
/// large to plausibly already be megabytes.
fn rescale_ram_field(obj: &mut Map<String, Value>, field: &str) {
    if let Some(value) = obj.get(field).and_then(Value::as_u64) {
        if value > PLAUSIBLE_MAX_RAM_MB {
            obj.insert(field.to_string(), Value::from(value / BYTES_PER_MB));
        }
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
