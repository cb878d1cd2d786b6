// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetches a job's input archive (`archiveRef`, an opaque handle into the
//! out-of-scope file service — spec.md §6) and unpacks it into a per-job
//! workspace directory the sandbox mounts read-write.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::AgentError;

/// Fetch `archive_ref` from `base_url` and unpack it into a fresh
/// subdirectory of `workspace_root` named after `job_id`. Returns the path
/// to that subdirectory.
pub async fn fetch_and_unpack(
    http: &reqwest::Client,
    base_url: &str,
    archive_ref: &str,
    job_id: &str,
    workspace_root: &Path,
) -> Result<PathBuf, AgentError> {
    let bytes = fetch(http, base_url, archive_ref).await?;
    let job_dir = workspace_root.join(job_id);
    unpack(&bytes, &job_dir)?;
    Ok(job_dir)
}

async fn fetch(http: &reqwest::Client, base_url: &str, archive_ref: &str) -> Result<bytes::Bytes, AgentError> {
    let url = format!("{}/{}", base_url.trim_end_matches('/'), archive_ref);
    let to_err = |reason: String| AgentError::ArchiveFetch { archive_ref: archive_ref.to_string(), reason };

    let response = http.get(&url).send().await.map_err(|e| to_err(e.to_string()))?;
    let response = response.error_for_status().map_err(|e| to_err(e.to_string()))?;
    response.bytes().await.map_err(|e| to_err(e.to_string()))
}

/// Extract a ZIP archive's contents into `dest`, creating it if absent.
///
/// Rejects any entry whose path would escape `dest` (a `../`-prefixed or
/// absolute entry name) rather than silently clamping it — a job's archive
/// is untrusted input.
fn unpack(bytes: &[u8], dest: &Path) -> Result<(), AgentError> {
    std::fs::create_dir_all(dest).map_err(|e| AgentError::ArchiveUnpack(e.to_string()))?;

    let reader = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(reader).map_err(|e| AgentError::ArchiveUnpack(format!("not a valid zip: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| AgentError::ArchiveUnpack(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "skipping archive entry with an unsafe path");
            continue;
        };
        let out_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| AgentError::ArchiveUnpack(e.to_string()))?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AgentError::ArchiveUnpack(e.to_string()))?;
        }
        let mut out_file =
            std::fs::File::create(&out_path).map_err(|e| AgentError::ArchiveUnpack(e.to_string()))?;
        std::io::copy(&mut entry, &mut out_file).map_err(|e| AgentError::ArchiveUnpack(e.to_string()))?;
    }

    info!(entries = archive.len(), dest = %dest.display(), "unpacked input archive");
    Ok(())
}

/// Remove a job's workspace directory once its run is finished, logging
/// rather than failing the job if cleanup itself fails.
pub fn cleanup(job_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(job_dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %job_dir.display(), error = %e, "failed to clean up job workspace");
        }
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
