// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container configuration for running jobs in the sandbox runner.

use serde::{Deserialize, Serialize};

/// Resource limits applied to a single container run.
///
/// `memory` follows Docker's human-readable size syntax (e.g. `"512m"`);
/// `cpu_quota` is a fractional core count (e.g. `2.0` for two cores).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub memory: String,
    pub cpu_quota: f64,
    #[serde(default = "default_tmp_tmpfs_mb")]
    pub tmp_tmpfs_mb: u64,
    #[serde(default = "default_run_tmpfs_mb")]
    pub run_tmpfs_mb: u64,
    #[serde(default = "default_pids_limit")]
    pub pids_limit: u32,
}

fn default_tmp_tmpfs_mb() -> u64 {
    64
}

fn default_run_tmpfs_mb() -> u64 {
    16
}

fn default_pids_limit() -> u32 {
    32
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory: "512m".to_string(),
            cpu_quota: 1.0,
            tmp_tmpfs_mb: default_tmp_tmpfs_mb(),
            run_tmpfs_mb: default_run_tmpfs_mb(),
            pids_limit: default_pids_limit(),
        }
    }
}

/// Container runtime configuration for a single sandbox invocation.
///
/// The image is picked by [`pick_image`] up front and carried here so the
/// backend doesn't need to re-derive it from the command string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container image (e.g. "python:3.12-slim").
    pub image: String,
    pub limits: ResourceLimits,
}

impl ContainerConfig {
    pub fn new(image: impl Into<String>, limits: ResourceLimits) -> Self {
        Self { image: image.into(), limits }
    }
}

/// Pick a container image from a runtime heuristic over the command string.
///
/// Priority order matches the spec exactly: python, node, gcc/g++, java,
/// dotnet, falling back to a minimal Linux image.
pub fn pick_image(command: &str) -> &'static str {
    let c = command.to_ascii_lowercase();
    if c.contains("python") || c.contains("py ") {
        "python:3.12-slim"
    } else if c.contains("node") || c.contains("npm") {
        "node:20-slim"
    } else if c.contains("g++") || c.contains("gcc") {
        "gcc:13"
    } else if c.contains("java") || c.contains("javac") {
        "eclipse-temurin:21-jdk"
    } else if c.contains("dotnet") {
        "mcr.microsoft.com/dotnet/sdk:8.0"
    } else {
        "alpine:3.20"
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
