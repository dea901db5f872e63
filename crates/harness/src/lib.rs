// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The split-phase measurement engine.
//!
//! Measuring a workload's latency and its device-resource footprint in the
//! same pass would let polling overhead leak into the timing distribution.
//! The harness therefore runs two separately bounded passes: the
//! [`runner::TimingRunner`] produces an uncontaminated timing distribution,
//! then the [`orchestrator::Orchestrator`] re-runs the workload a capped
//! number of additional rounds under an active
//! [`MetricPoller`](accelbench_sampler::MetricPoller), and merges both —
//! plus any registered custom metrics and allocation-log figures — into one
//! immutable result record.
//!
//! Because the sampling pass re-runs the whole workload, workloads must be
//! side-effect-free across repeated invocation within one benchmark. That is
//! the workload author's contract; the harness does not enforce it.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod sink;

pub use clock::{Clock, MonotonicClock};
pub use config::{BenchmarkConfig, SamplingOptions, TimingOptions};
pub use metrics::MetricRegistry;
pub use orchestrator::{BenchmarkSpec, Orchestrator};
pub use runner::{TimingRunner, TimingSamples};
pub use sink::JsonDirSink;

/// Error type a workload may fail with.
pub type WorkloadError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of one workload invocation.
pub type WorkloadResult<T> = std::result::Result<T, WorkloadError>;
