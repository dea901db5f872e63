// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Explicit per-run context.
//!
//! A [`Session`] is created once at run start, passed by reference into every
//! orchestrator call, and torn down explicitly by [`Session::finish`]. There
//! is no session-wide mutable global; everything a benchmark needs travels
//! through this value.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::result::BenchmarkResult;
use crate::sink::ResultSink;

/// Identity of the accelerator observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratorInfo {
    /// Device product name.
    pub name: String,
    /// Driver version string reported by the backend.
    pub driver_version: String,
}

/// Run-level metadata handed to the result sink once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Host machine name.
    pub machine: String,
    /// Operating system description.
    pub os: String,
    /// Total installed RAM, bytes.
    pub ram_bytes: u64,
    /// Accelerator identity, when a device probe was available.
    pub accelerator: Option<AcceleratorInfo>,
    /// Source commit the benchmarked code was built from.
    pub commit: Option<String>,
    /// Session start time.
    pub timestamp: DateTime<Utc>,
}

impl RunMetadata {
    /// Collect metadata from the running host.
    pub fn collect(commit: Option<String>) -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            machine: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            os: System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            ram_bytes: system.total_memory(),
            accelerator: None,
            commit,
            timestamp: Utc::now(),
        }
    }

    /// Attach accelerator identity once a probe has been opened.
    pub fn with_accelerator(mut self, info: AcceleratorInfo) -> Self {
        self.accelerator = Some(info);
        self
    }
}

/// Accumulates results for one benchmarking run.
///
/// Benchmarks run sequentially within a session; names must be unique.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    metadata: RunMetadata,
    results: Vec<BenchmarkResult>,
    names: HashSet<String>,
}

impl Session {
    /// Start a session with the given run metadata.
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata,
            results: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run-level metadata.
    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    /// Replace the accelerator identity recorded for this run.
    pub fn set_accelerator(&mut self, info: AcceleratorInfo) {
        self.metadata.accelerator = Some(info);
    }

    /// Record a completed benchmark result.
    ///
    /// Names must be unique within the session; a duplicate is refused and
    /// the result is returned untouched inside the error path.
    pub fn record(&mut self, result: BenchmarkResult) -> Result<()> {
        if !self.names.insert(result.name.clone()) {
            return Err(Error::DuplicateBenchmark(result.name));
        }
        self.results.push(result);
        Ok(())
    }

    /// Results recorded so far, in execution order.
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no benchmark has completed yet.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Tear the session down, handing every result and the metadata block to
    /// the sink. The core drops the records afterwards; persistence is the
    /// sink's concern.
    pub fn finish(self, sink: &mut dyn ResultSink) -> Result<()> {
        tracing::debug!(
            session = %self.id,
            benchmarks = self.results.len(),
            "finishing session"
        );
        sink.write_session(&self.metadata, &self.results)
    }
}
