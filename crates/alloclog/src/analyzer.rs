// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-pass peak/leak analysis.
//!
//! The scan keeps one running balance: allocate adds, free subtracts, the
//! peak is the highest balance ever seen and the leak is whatever balance
//! remains at the end of the bracket. O(n) time, O(1) state — the log is
//! streamed, never buffered, since allocation-heavy workloads produce large
//! logs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use accelbench_core::stats::AllocationFigures;
use accelbench_core::Result;

use crate::event::{Action, AllocationEvent, Columns};

/// A non-fatal inconsistency observed during the scan.
///
/// A free with no matching prior allocate drives the balance negative. That
/// is reported, never clamped: it means either a missing log record or a
/// free of memory allocated before logging was enabled, and the reader
/// should know which figures it taints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyWarning {
    /// 1-based log line of the offending record, when scanning a file.
    pub line: Option<usize>,
    /// Balance after the offending free, bytes.
    pub balance_bytes: i64,
    /// Human-readable description.
    pub detail: String,
}

/// Outcome of one log scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAnalysis {
    /// Maximum concurrent allocation balance, bytes.
    pub peak_bytes: u64,
    /// Residual balance at the end of the bracket, bytes. Negative only when
    /// the log is inconsistent.
    pub leaked_bytes: i64,
    /// Balance-affecting records scanned.
    pub events: u64,
    /// Inconsistencies observed, empty for a well-formed log.
    pub warnings: Vec<ConsistencyWarning>,
}

impl LogAnalysis {
    /// The figures the statistics aggregator folds into a resource record.
    pub fn figures(&self) -> AllocationFigures {
        AllocationFigures {
            peak_bytes: self.peak_bytes,
            leaked_bytes: self.leaked_bytes,
        }
    }
}

/// Running scan state, shared by the streaming and pre-parsed entry points.
#[derive(Debug, Default)]
struct Scan {
    balance: i64,
    peak: i64,
    events: u64,
    warnings: Vec<ConsistencyWarning>,
}

impl Scan {
    fn push(&mut self, action: Action, size_bytes: u64, line: Option<usize>) {
        self.events += 1;
        let size = size_bytes as i64;
        match action {
            Action::Allocate => {
                self.balance += size;
                self.peak = self.peak.max(self.balance);
            }
            Action::Free => {
                let was_negative = self.balance < 0;
                self.balance -= size;
                if self.balance < 0 && !was_negative {
                    tracing::warn!(
                        balance = self.balance,
                        "allocation balance went negative; log is missing allocate records"
                    );
                    self.warnings.push(ConsistencyWarning {
                        line,
                        balance_bytes: self.balance,
                        detail: format!(
                            "free of {size_bytes} byte(s) with no matching allocate drove the \
                             balance to {}",
                            self.balance
                        ),
                    });
                }
            }
        }
    }

    fn finish(self) -> LogAnalysis {
        LogAnalysis {
            peak_bytes: self.peak.max(0) as u64,
            leaked_bytes: self.balance,
            events: self.events,
            warnings: self.warnings,
        }
    }
}

fn scan_reader<R: BufRead>(reader: R, scan: &mut Scan) -> Result<()> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        // An empty log is a valid bracket in which nothing was allocated.
        None => return Ok(()),
    };
    let columns = Columns::from_header(&header)?;

    for (index, line) in lines.enumerate() {
        let line_no = index + 2;
        let record = line?;
        if record.trim().is_empty() {
            continue;
        }
        if let Some(event) = columns.parse_record(&record, line_no)? {
            scan.push(event.action, event.size_bytes, Some(line_no));
        }
    }
    Ok(())
}

/// Analyze a CSV record stream (header line first).
///
/// The reader is consumed line by line; the whole log is never held in
/// memory.
pub fn analyze<R: BufRead>(reader: R) -> Result<LogAnalysis> {
    let mut scan = Scan::default();
    scan_reader(reader, &mut scan)?;
    Ok(scan.finish())
}

/// Analyze pre-parsed events in their given order.
pub fn analyze_events<I>(events: I) -> LogAnalysis
where
    I: IntoIterator<Item = AllocationEvent>,
{
    let mut scan = Scan::default();
    for event in events {
        scan.push(event.action, event.size_bytes, None);
    }
    scan.finish()
}

/// Analyze several per-device log files as one bracket, in the given order,
/// with a single running balance carried across all of them.
pub fn analyze_files<P: AsRef<Path>>(paths: &[P]) -> Result<LogAnalysis> {
    let mut scan = Scan::default();
    for path in paths {
        scan_reader(BufReader::new(File::open(path)?), &mut scan)?;
    }
    Ok(scan.finish())
}
