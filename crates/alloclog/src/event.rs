// Copyright 2025 AccelBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Allocation-log records.
//!
//! The log format is consumed verbatim from the allocator instrumentation
//! and must stay compatible: comma-delimited records under the header
//! `Thread,Time,Action,Pointer,Size,Stream`, one record per line, one file
//! per device with a `.dev<N>` filename suffix. Columns are resolved by
//! header name, not position.

use serde::{Deserialize, Serialize};

use accelbench_core::{Error, Result};

/// What an allocation-log record did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Memory was allocated.
    Allocate,
    /// Memory was returned.
    Free,
}

/// One allocation-log record.
///
/// Thread, time, address and stream are carried through for diagnostics;
/// the peak/leak computation needs only the action and size. Record order in
/// the log is authoritative: events are emitted in timestamp order with ties
/// broken by emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEvent {
    /// Emitting thread id, verbatim.
    pub thread: String,
    /// Timestamp, verbatim.
    pub time: String,
    /// Allocate or free.
    pub action: Action,
    /// Pointer value, verbatim (usually hex).
    pub address: String,
    /// Allocation size, bytes.
    pub size_bytes: u64,
    /// Stream id, verbatim.
    pub stream: String,
}

/// Column positions resolved from a header line.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Columns {
    thread: usize,
    time: usize,
    action: usize,
    pointer: usize,
    size: usize,
    stream: usize,
}

impl Columns {
    /// Resolve the six required columns from the header record.
    pub(crate) fn from_header(header: &str) -> Result<Self> {
        let find = |name: &str| {
            header
                .split(',')
                .position(|col| col.trim() == name)
                .ok_or_else(|| Error::LogFormat {
                    line: 1,
                    reason: format!("missing column '{name}' in header '{}'", header.trim()),
                })
        };
        Ok(Self {
            thread: find("Thread")?,
            time: find("Time")?,
            action: find("Action")?,
            pointer: find("Pointer")?,
            size: find("Size")?,
            stream: find("Stream")?,
        })
    }

    /// Parse one data record. Returns `None` for actions outside
    /// allocate/free (the allocator also logs failures and reallocations,
    /// which the balance scan ignores, matching the consumed format).
    pub(crate) fn parse_record(
        &self,
        record: &str,
        line: usize,
    ) -> Result<Option<AllocationEvent>> {
        let fields: Vec<&str> = record.split(',').collect();
        let field = |index: usize, name: &str| {
            fields.get(index).map(|f| f.trim()).ok_or_else(|| Error::LogFormat {
                line,
                reason: format!("record has {} field(s), no '{name}' column", fields.len()),
            })
        };

        let action = match field(self.action, "Action")? {
            "allocate" => Action::Allocate,
            "free" => Action::Free,
            other => {
                tracing::debug!(line, action = other, "skipping non-balance record");
                return Ok(None);
            }
        };

        let size_field = field(self.size, "Size")?;
        let size_bytes = size_field.parse::<u64>().map_err(|_| Error::LogFormat {
            line,
            reason: format!("invalid size '{size_field}'"),
        })?;

        Ok(Some(AllocationEvent {
            thread: field(self.thread, "Thread")?.to_string(),
            time: field(self.time, "Time")?.to_string(),
            action,
            address: field(self.pointer, "Pointer")?.to_string(),
            size_bytes,
            stream: field(self.stream, "Stream")?.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Thread,Time,Action,Pointer,Size,Stream";

    #[test]
    fn test_parse_record() {
        let cols = Columns::from_header(HEADER).unwrap();
        let event = cols
            .parse_record("1,10:20:59.680,allocate,0x7f2c0000,256,0", 2)
            .unwrap()
            .unwrap();
        assert_eq!(event.thread, "1");
        assert_eq!(event.action, Action::Allocate);
        assert_eq!(event.address, "0x7f2c0000");
        assert_eq!(event.size_bytes, 256);
        assert_eq!(event.stream, "0");
    }

    #[test]
    fn test_columns_resolved_by_name_not_position() {
        let cols = Columns::from_header("Time,Thread,Stream,Size,Pointer,Action").unwrap();
        let event = cols
            .parse_record("t0,7,2,128,0xdead,free", 2)
            .unwrap()
            .unwrap();
        assert_eq!(event.action, Action::Free);
        assert_eq!(event.size_bytes, 128);
        assert_eq!(event.thread, "7");
    }

    #[test]
    fn test_missing_header_column_is_an_error() {
        let err = Columns::from_header("Thread,Time,Action,Pointer,Stream").unwrap_err();
        assert!(matches!(err, Error::LogFormat { line: 1, .. }));
        assert!(err.to_string().contains("Size"));
    }

    #[test]
    fn test_invalid_size_is_an_error() {
        let cols = Columns::from_header(HEADER).unwrap();
        let err = cols
            .parse_record("1,t,allocate,0x0,lots,0", 3)
            .unwrap_err();
        assert!(matches!(err, Error::LogFormat { line: 3, .. }));
    }

    #[test]
    fn test_unknown_action_is_skipped() {
        let cols = Columns::from_header(HEADER).unwrap();
        let parsed = cols
            .parse_record("1,t,allocate failure,0x0,64,0", 4)
            .unwrap();
        assert!(parsed.is_none());
    }
}
