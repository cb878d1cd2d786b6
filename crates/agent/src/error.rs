// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker agent's own error taxonomy, matching the per-crate
//! `thiserror::Error` style used throughout the workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to connect to coordinator at {addr}: {source}")]
    Connect { addr: String, #[source] source: std::io::Error },

    #[error("wire protocol error: {0}")]
    Protocol(#[from] forge_wire::ProtocolError),

    #[error("coordinator rejected the request: {0}")]
    Api(#[from] forge_wire::ApiErrorBody),

    #[error("connection closed by the coordinator")]
    ConnectionClosed,

    #[error("failed to fetch input archive {archive_ref}: {reason}")]
    ArchiveFetch { archive_ref: String, reason: String },

    #[error("failed to unpack input archive: {0}")]
    ArchiveUnpack(String),

    #[error(transparent)]
    Sandbox(#[from] forge_sandbox::SandboxError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
