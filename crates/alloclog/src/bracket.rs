// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Enable/disable bracketing of allocator logging.
//!
//! The allocator hook is external to this crate; [`AllocationLogControl`] is
//! the exact capability set the bracket needs from it. A [`LogBracket`]
//! enables logging, lets the caller run the workload, then flushes, parses
//! every per-device log file and deletes them. Event records only live for
//! the duration of one bracket.

use std::fs;
use std::path::PathBuf;

use accelbench_core::Result;

use crate::analyzer::{analyze_files, LogAnalysis};

/// Operations the bracket needs from the allocator's logging hook.
pub trait AllocationLogControl {
    /// Begin writing allocation records. The hook derives one output file
    /// per observed device from `prefix`, suffixed `.dev<N>`.
    fn enable(&mut self, prefix: &str) -> Result<()>;

    /// Flush buffered records and stop logging, returning the per-device
    /// log files that were written.
    fn disable(&mut self) -> Result<Vec<PathBuf>>;
}

/// An open logging bracket.
///
/// Created by [`LogBracket::enable`]; consumed by [`LogBracket::finish`],
/// which yields the analysis of everything logged in between.
pub struct LogBracket<'a> {
    control: &'a mut dyn AllocationLogControl,
}

impl<'a> LogBracket<'a> {
    /// Enable logging through `control` with the given file-name prefix.
    pub fn enable(control: &'a mut dyn AllocationLogControl, prefix: &str) -> Result<Self> {
        control.enable(prefix)?;
        Ok(Self { control })
    }

    /// Disable logging, analyze the written files and delete them.
    ///
    /// Deletion failures are logged but do not mask the analysis: the
    /// figures were already computed and a stale temp file is recoverable.
    pub fn finish(self) -> Result<LogAnalysis> {
        let mut files = self.control.disable()?;
        // Stable scan order regardless of how the hook enumerates devices.
        files.sort();
        let analysis = analyze_files(&files)?;
        for file in &files {
            if let Err(err) = fs::remove_file(file) {
                tracing::warn!(file = %file.display(), %err, "failed to delete allocation log");
            }
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const HEADER: &str = "Thread,Time,Action,Pointer,Size,Stream";

    /// Test control that "logs" canned per-device CSV bodies to disk.
    struct CannedControl {
        dir: PathBuf,
        bodies: Vec<&'static str>,
        prefix: Option<String>,
        files: Vec<PathBuf>,
    }

    impl CannedControl {
        fn new(dir: &Path, bodies: Vec<&'static str>) -> Self {
            Self {
                dir: dir.to_path_buf(),
                bodies,
                prefix: None,
                files: Vec::new(),
            }
        }
    }

    impl AllocationLogControl for CannedControl {
        fn enable(&mut self, prefix: &str) -> Result<()> {
            self.prefix = Some(prefix.to_string());
            Ok(())
        }

        fn disable(&mut self) -> Result<Vec<PathBuf>> {
            let prefix = self.prefix.take().expect("enable was called");
            let mut files = Vec::new();
            for (device, body) in self.bodies.iter().enumerate() {
                let path = self.dir.join(format!("{prefix}.dev{device}"));
                fs::write(&path, format!("{HEADER}\n{body}"))?;
                files.push(path);
            }
            self.files = files.clone();
            Ok(files)
        }
    }

    #[test]
    fn test_bracket_analyzes_and_deletes_logs() {
        let dir = tempfile::tempdir().unwrap();
        let mut control = CannedControl::new(
            dir.path(),
            vec!["1,t0,allocate,0xa,100,0\n1,t1,free,0xa,100,0", "2,t0,allocate,0xb,40,0"],
        );

        let bracket = LogBracket::enable(&mut control, "bench_log").unwrap();
        let analysis = bracket.finish().unwrap();

        assert_eq!(analysis.peak_bytes, 100);
        assert_eq!(analysis.leaked_bytes, 40);
        for file in &control.files {
            assert!(!file.exists(), "log file should be deleted after analysis");
        }
    }

    #[test]
    fn test_bracket_with_no_devices() {
        let dir = tempfile::tempdir().unwrap();
        let mut control = CannedControl::new(dir.path(), Vec::new());
        let bracket = LogBracket::enable(&mut control, "bench_log").unwrap();
        let analysis = bracket.finish().unwrap();
        assert_eq!(analysis.events, 0);
        assert_eq!(analysis.leaked_bytes, 0);
    }
}
