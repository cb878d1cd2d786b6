// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn image_heuristic_priority_order() {
    assert_eq!(pick_image("python3 solve.py"), "python:3.12-slim");
    assert_eq!(pick_image("npm install && node index.js"), "node:20-slim");
    assert_eq!(pick_image("g++ -O2 main.cpp -o main"), "gcc:13");
    assert_eq!(pick_image("javac Main.java && java Main"), "eclipse-temurin:21-jdk");
    assert_eq!(pick_image("dotnet run"), "mcr.microsoft.com/dotnet/sdk:8.0");
    assert_eq!(pick_image("echo hello"), "alpine:3.20");
}

#[test]
fn image_heuristic_is_case_insensitive() {
    assert_eq!(pick_image("PYTHON script.py"), "python:3.12-slim");
}

#[test]
fn default_limits_are_conservative() {
    let limits = ResourceLimits::default();
    assert_eq!(limits.memory, "512m");
    assert_eq!(limits.pids_limit, 32);
}
