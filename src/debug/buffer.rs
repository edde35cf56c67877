use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Stream tag for one fragment of adapter output (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
    Console,
    Telemetry,
}

impl OutputStream {
    pub fn from_dap_category(category: &str) -> Self {
        match category {
            "stdout" => OutputStream::Stdout,
            "stderr" => OutputStream::Stderr,
            "telemetry" => OutputStream::Telemetry,
            _ => OutputStream::Console,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub stream: OutputStream,
    pub bytes: String,
    pub offset: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

const DEFAULT_RECORD_CAP: usize = 4096;
const DEFAULT_BYTE_CAP: usize = 8 * 1024 * 1024;

/// Bounded per-session ring of output fragments with monotonic offsets
/// (spec §4.7/C4). Oldest records are dropped on overflow; `dropped` is
/// monotonically non-decreasing per property 7 of spec §8.
pub struct OutputBuffer {
    records: VecDeque<OutputRecord>,
    next_offset: u64,
    record_cap: usize,
    byte_cap: usize,
    total_bytes: usize,
    dropped: u64,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::with_caps(DEFAULT_RECORD_CAP, DEFAULT_BYTE_CAP)
    }

    pub fn with_caps(record_cap: usize, byte_cap: usize) -> Self {
        Self {
            records: VecDeque::new(),
            next_offset: 0,
            record_cap,
            byte_cap,
            total_bytes: 0,
            dropped: 0,
        }
    }

    /// Append a fragment, assigning it the next offset. Evicts the oldest
    /// record(s) if either cap would be exceeded.
    pub fn push(&mut self, stream: OutputStream, bytes: String) -> u64 {
        let offset = self.next_offset;
        self.next_offset += 1;
        self.total_bytes += bytes.len();

        self.records.push_back(OutputRecord {
            stream,
            bytes,
            offset,
            timestamp: chrono::Utc::now(),
        });

        while self.records.len() > self.record_cap || self.total_bytes > self.byte_cap {
            if let Some(evicted) = self.records.pop_front() {
                self.total_bytes = self.total_bytes.saturating_sub(evicted.bytes.len());
                self.dropped += 1;
            } else {
                break;
            }
        }

        offset
    }

    /// Records with offset strictly greater than `since_offset`, optionally
    /// filtered to one stream, capped at `max` records.
    pub fn drain_since(
        &self,
        since_offset: u64,
        stream: Option<OutputStream>,
        max: Option<usize>,
    ) -> (Vec<OutputRecord>, u64, u64) {
        let mut out: Vec<OutputRecord> = self
            .records
            .iter()
            .filter(|r| r.offset > since_offset)
            .filter(|r| stream.map(|s| s == r.stream).unwrap_or(true))
            .cloned()
            .collect();

        if let Some(max) = max {
            out.truncate(max);
        }

        let next = out.last().map(|r| r.offset).unwrap_or(since_offset);
        (out, next, self.dropped)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
