// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Filesystem result sink.
//!
//! Writes one session to a directory: an individual JSON file per benchmark
//! under `raw/`, a combined `all_results.json` carrying the run metadata,
//! and a human-readable `summary.md`. This is one implementation of the
//! [`ResultSink`] boundary; the persisted layout here is not part of the
//! core's contract.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use accelbench_core::{BenchmarkResult, Result, ResultSink, RunMetadata};

use crate::report;

/// Combined on-disk document for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Run-level metadata block.
    pub metadata: RunMetadata,
    /// Every result recorded in the session.
    pub results: Vec<BenchmarkResult>,
}

/// Sink writing JSON and markdown output under a base directory.
#[derive(Debug)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    /// Sink rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the combined results document.
    pub fn combined_path(&self) -> PathBuf {
        self.dir.join("all_results.json")
    }

    /// Path of the markdown summary.
    pub fn summary_path(&self) -> PathBuf {
        self.dir.join("summary.md")
    }

    fn raw_dir(&self) -> PathBuf {
        self.dir.join("raw")
    }
}

impl ResultSink for JsonDirSink {
    fn write_session(
        &mut self,
        metadata: &RunMetadata,
        results: &[BenchmarkResult],
    ) -> Result<()> {
        fs::create_dir_all(self.raw_dir())?;

        for result in results {
            let file = self.raw_dir().join(format!("{}.json", file_stem(result)));
            fs::write(&file, serde_json::to_string_pretty(result)?)?;
        }

        let record = SessionRecord {
            metadata: metadata.clone(),
            results: results.to_vec(),
        };
        fs::write(self.combined_path(), serde_json::to_string_pretty(&record)?)?;
        fs::write(
            self.summary_path(),
            report::generate_summary(metadata, results),
        )?;

        tracing::debug!(dir = %self.dir.display(), results = results.len(), "session written");
        Ok(())
    }
}

/// Filesystem-safe stem for a result's raw file.
fn file_stem(result: &BenchmarkResult) -> String {
    result
        .display_name()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '=') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Read a combined results document back from disk.
pub fn read_session(path: impl AsRef<Path>) -> Result<SessionRecord> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
