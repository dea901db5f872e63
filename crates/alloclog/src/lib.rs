// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Allocation-log capture and analysis.
//!
//! Allocator instrumentation writes a CSV event log on its own hot path;
//! analysis happens after the fact, decoupled from the workload. This crate
//! keeps that two-phase shape: a [`LogBracket`](bracket::LogBracket) toggles
//! logging on and off around a measurement, and the
//! [`analyzer`] consumes the resulting record stream in a single forward
//! pass, computing peak concurrent usage and residual leak.
//!
//! The analyzer reads any [`std::io::BufRead`], so tests and callers can run
//! it over in-memory buffers as easily as over log files.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analyzer;
pub mod bracket;
pub mod event;

pub use analyzer::{analyze, analyze_events, analyze_files, ConsistencyWarning, LogAnalysis};
pub use bracket::{AllocationLogControl, LogBracket};
pub use event::{Action, AllocationEvent};
