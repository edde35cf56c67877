use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::timeout;

/// Event kinds exposed upward to pollers (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Stopped,
    Continued,
    Terminated,
    Exited,
    Thread,
    OutputAvailable,
    BreakpointChanged,
    Module,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub kind: EventKind,
    pub payload: Value,
    pub offset: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

const DEFAULT_CAP: usize = 2048;

/// Bounded per-session FIFO of debugger events with monotonic offsets
/// (spec §4.7/C5). Supports blocking (`wait_ms`) and non-blocking drains;
/// the `Notify` is signalled on every append so a blocked poller wakes as
/// soon as a record lands, mirroring the teacher's oneshot-signal pattern
/// used to await the `initialized` event during launch.
pub struct EventQueue {
    inner: Mutex<Inner>,
    notify: Notify,
}

struct Inner {
    records: VecDeque<EventRecord>,
    next_offset: u64,
    cap: usize,
    dropped: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: VecDeque::new(),
                next_offset: 0,
                cap,
                dropped: 0,
            }),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, kind: EventKind, payload: Value) -> u64 {
        let offset = {
            let mut inner = self.inner.lock().unwrap();
            let offset = inner.next_offset;
            inner.next_offset += 1;
            inner.records.push_back(EventRecord {
                kind,
                payload,
                offset,
                timestamp: chrono::Utc::now(),
            });
            while inner.records.len() > inner.cap {
                if inner.records.pop_front().is_some() {
                    inner.dropped += 1;
                } else {
                    break;
                }
            }
            offset
        };
        self.notify.notify_waiters();
        offset
    }

    fn snapshot_since(&self, since_offset: u64, max: Option<usize>) -> (Vec<EventRecord>, u64, u64) {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<EventRecord> = inner
            .records
            .iter()
            .filter(|r| r.offset > since_offset)
            .cloned()
            .collect();
        if let Some(max) = max {
            out.truncate(max);
        }
        let next = out.last().map(|r| r.offset).unwrap_or(since_offset);
        (out, next, inner.dropped)
    }

    /// `poll_events(since_offset, max, wait_ms)` (spec §4.5/§4.7). If no
    /// records are immediately available and `wait_ms` > 0, blocks up to
    /// that long for the first record to arrive.
    pub async fn poll(
        &self,
        since_offset: u64,
        max: Option<usize>,
        wait_ms: u64,
    ) -> (Vec<EventRecord>, u64, u64) {
        let first = self.snapshot_since(since_offset, max);
        if !first.0.is_empty() || wait_ms == 0 {
            return first;
        }

        let notified = self.notify.notified();
        let _ = timeout(Duration::from_millis(wait_ms), notified).await;
        self.snapshot_since(since_offset, max)
    }

    pub fn dropped(&self) -> u64 {
        self.inner.lock().unwrap().dropped
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
