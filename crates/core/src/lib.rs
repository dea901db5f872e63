// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core data model for the AccelBench measurement harness.
//!
//! This crate defines the types shared by every other AccelBench crate:
//!
//! - [`result`] - The immutable [`BenchmarkResult`] record and its parts
//! - [`stats`] - Timing statistics and the pure merge that builds a result
//! - [`session`] - Explicit per-run context and machine metadata
//! - [`sink`] - The boundary trait results are handed to once a session ends
//! - [`error`] - The error taxonomy used across the workspace
//!
//! # Quick Start
//!
//! ```
//! use accelbench_core::stats::TimingStats;
//!
//! let stats = TimingStats::from_round_samples(&[0.010, 0.012, 0.011], 100).unwrap();
//! assert_eq!(stats.rounds, 3);
//! assert!(stats.mean > 0.010);
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod result;
pub mod session;
pub mod sink;
pub mod stats;

pub use error::{Error, Phase, Result};
pub use result::{BenchmarkResult, MetricValue, Parameter, ResourceStats};
pub use session::{AcceleratorInfo, RunMetadata, Session};
pub use sink::ResultSink;
pub use stats::TimingStats;

/// Unit strings attached to built-in measurements.
///
/// The aggregator never infers a unit; every value it records carries one of
/// these or a caller-supplied string.
pub mod units {
    /// Timing fields.
    pub const SECONDS: &str = "seconds";
    /// Memory fields.
    pub const BYTES: &str = "bytes";
    /// Utilization fields.
    pub const PERCENT: &str = "percent";
}
