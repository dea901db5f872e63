// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the AccelBench workspace.
//!
//! Failures are isolated per benchmark: a device that cannot be queried
//! degrades one benchmark to timing-only results, and a failing workload
//! aborts one benchmark without touching the rest of the session.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The measurement phase a failure occurred in.
///
/// Carried on [`Error::Execution`] so a failure can be diagnosed from the
/// report alone, without inspecting harness internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Calibration or a timed round.
    Timing,
    /// A resource-sampling re-invocation of the workload.
    Sampling,
    /// Allocation-log capture or parsing.
    LogAnalysis,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Timing => f.write_str("timing"),
            Phase::Sampling => f.write_str("sampling"),
            Phase::LogAnalysis => f.write_str("log-analysis"),
        }
    }
}

/// Errors produced by the AccelBench crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The timer cannot resolve a single iteration even after the iteration
    /// count has been scaled up. Recoverable inside the runner until its
    /// scaling budget is exhausted; only then is it surfaced.
    #[error(
        "calibration failed: a round of {iterations} iteration(s) finished in {elapsed:?}, \
         below the resolvable minimum of {target:?}"
    )]
    Calibration {
        /// Iterations per round at the last calibration attempt.
        iterations: u64,
        /// Observed duration of that round.
        elapsed: Duration,
        /// Smallest round duration the clock can resolve reliably.
        target: Duration,
    },

    /// The requested device cannot be queried. Fatal for the resource-sampling
    /// phase of the affected benchmark only.
    #[error("device {device} unavailable: {reason}")]
    DeviceUnavailable {
        /// Configured device index.
        device: u32,
        /// Backend-specific explanation.
        reason: String,
    },

    /// The workload itself failed. No partial result is emitted for the
    /// affected benchmark.
    #[error("benchmark '{benchmark}' failed during {phase}: {reason}")]
    Execution {
        /// Hierarchical benchmark name.
        benchmark: String,
        /// Phase the failure occurred in.
        phase: Phase,
        /// Underlying failure description.
        reason: String,
    },

    /// A record in an allocation log does not match the expected format.
    #[error("allocation log line {line}: {reason}")]
    LogFormat {
        /// 1-based line number within the log file.
        line: usize,
        /// What was wrong with the record.
        reason: String,
    },

    /// A benchmark with this name was already recorded in the session.
    #[error("benchmark '{0}' already recorded in this session")]
    DuplicateBenchmark(String),

    /// A custom metric with this name was already registered.
    #[error("custom metric '{0}' already registered")]
    DuplicateMetric(String),

    /// Inputs handed to the statistics aggregator violate its invariants.
    #[error("invalid statistics: {0}")]
    Stats(String),

    /// Filesystem failure in a sink or log bracket.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Result serialization failure.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a workload failure with the benchmark name and phase it hit.
    pub fn execution(
        benchmark: impl Into<String>,
        phase: Phase,
        reason: impl fmt::Display,
    ) -> Self {
        Error::Execution {
            benchmark: benchmark.into(),
            phase,
            reason: reason.to_string(),
        }
    }
}
