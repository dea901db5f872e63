// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Boundary trait for result persistence.
//!
//! The core produces one metadata block and a list of results per session and
//! hands them across this seam exactly once. What the store does with them —
//! directory of JSON files, a database, a comparison report — is outside the
//! core's contract.

use crate::error::Result;
use crate::result::BenchmarkResult;
use crate::session::RunMetadata;

/// Receives the complete output of one benchmarking session.
pub trait ResultSink {
    /// Persist the run metadata and every recorded result.
    fn write_session(&mut self, metadata: &RunMetadata, results: &[BenchmarkResult])
        -> Result<()>;
}
