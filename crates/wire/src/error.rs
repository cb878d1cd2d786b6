// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds that cross the wire between coordinator and worker/client.

use serde::{Deserialize, Serialize};

/// The four error kinds a `CoordinatorApi` call can fail with.
///
/// This is the only error shape ever serialized onto the wire — crate-local
/// `thiserror` enums (`forge_sandbox::SandboxError`, `forge_state::StateError`,
/// etc.) are mapped down to one of these plus a human-readable message before
/// a response is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed request; no state change.
    InvalidArgument,
    /// Unknown job or worker id.
    NotFound,
    /// Operation invalid for the record's current state.
    ConflictingState,
    /// Internal fault (e.g. StateStore write failure); mutation may already
    /// be applied in memory, see spec's `TransientIO` propagation policy.
    Internal,
}

forge_core::simple_display! {
    ErrorKind {
        InvalidArgument => "invalid_argument",
        NotFound => "not_found",
        ConflictingState => "conflicting_state",
        Internal => "internal",
    }
}

/// An error response, carrying the kind plus a message for operators/clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiErrorBody {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflicting_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictingState, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
