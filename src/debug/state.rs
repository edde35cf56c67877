use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session state machine (spec §3). Six states, the transitions below are
/// enforced by `DebugSession`, not by this type — `SessionState` only
/// stores the current value and the data that accompanies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebugState {
    Created,
    Launching,
    Running,
    Stopped,
    Terminated,
    Failed,
}

impl DebugState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugState::Created => "CREATED",
            DebugState::Launching => "LAUNCHING",
            DebugState::Running => "RUNNING",
            DebugState::Stopped => "STOPPED",
            DebugState::Terminated => "TERMINATED",
            DebugState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for DebugState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `stopped` reason as reported by the adapter (spec §3 stop context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    Breakpoint,
    Step,
    Pause,
    Exception,
    Entry,
}

impl StopReason {
    pub fn from_dap(reason: &str) -> Self {
        match reason {
            "breakpoint" => StopReason::Breakpoint,
            "step" => StopReason::Step,
            "pause" => StopReason::Pause,
            "exception" => StopReason::Exception,
            "entry" => StopReason::Entry,
            // Adapters occasionally report reasons outside the DAP enum
            // (e.g. "function breakpoint", "data breakpoint"); bucket
            // those as Breakpoint rather than failing the stop.
            _ => StopReason::Breakpoint,
        }
    }
}

/// Present only while the session is STOPPED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopContext {
    pub thread_id: i64,
    pub reason: StopReason,
    pub top_frame_id: Option<i64>,
    pub hit_breakpoint_ids: Vec<i32>,
}

/// Breakpoint record keyed by (source path, line); spec §3 and §9 mandate
/// that user intent (path, line, condition) is the persisted identity —
/// the adapter-assigned id is re-mapped on every `setBreakpoints` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakpoint {
    pub line: i64,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub adapter_id: Option<i64>,
}

impl Breakpoint {
    pub fn new(line: i64, condition: Option<String>, hit_condition: Option<String>) -> Self {
        Self {
            line,
            condition,
            hit_condition,
            verified: false,
            adapter_id: None,
        }
    }
}

/// A watch expression re-evaluated on demand or on every stop (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchExpression {
    pub id: String,
    pub expression: String,
    pub last_value: Option<String>,
    pub last_error: Option<String>,
    pub last_frame_id: Option<i64>,
}

impl WatchExpression {
    pub fn new(id: String, expression: String) -> Self {
        Self {
            id,
            expression,
            last_value: None,
            last_error: None,
            last_frame_id: None,
        }
    }
}

/// Mutable per-session state: state machine position, breakpoint table,
/// watch list, stop context, and the thread set the adapter has reported.
///
/// Ownership: a `DebugSession` owns exactly one `SessionState` behind a
/// lock; the registry never reaches into it directly (spec §3 ownership
/// rule, spec §5 "no lock held across a DAP request").
#[derive(Debug, Clone)]
pub struct SessionState {
    pub state: DebugState,
    pub failure_reason: Option<String>,
    pub breakpoints: HashMap<String, Vec<Breakpoint>>,
    pub watches: Vec<WatchExpression>,
    pub stop_context: Option<StopContext>,
    pub threads: Vec<i64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            state: DebugState::Created,
            failure_reason: None,
            breakpoints: HashMap::new(),
            watches: Vec::new(),
            stop_context: None,
            threads: Vec::new(),
        }
    }

    pub fn set_state(&mut self, state: DebugState) {
        self.state = state;
    }

    pub fn fail(&mut self, reason: String) {
        self.state = DebugState::Failed;
        self.failure_reason = Some(reason);
    }

    /// Replace the full breakpoint set for one source path (DAP semantics:
    /// `setBreakpoints` always replaces, never merges).
    pub fn replace_breakpoints(&mut self, source: &str, breakpoints: Vec<Breakpoint>) {
        self.breakpoints.insert(source.to_string(), breakpoints);
    }

    pub fn get_breakpoints(&self, source: &str) -> Vec<Breakpoint> {
        self.breakpoints.get(source).cloned().unwrap_or_default()
    }

    pub fn clear_breakpoints(&mut self, source: Option<&str>) -> usize {
        match source {
            Some(path) => self
                .breakpoints
                .remove(path)
                .map(|v| v.len())
                .unwrap_or(0),
            None => {
                let count = self.breakpoints.values().map(|v| v.len()).sum();
                self.breakpoints.clear();
                count
            }
        }
    }

    pub fn add_thread(&mut self, thread_id: i64) {
        if !self.threads.contains(&thread_id) {
            self.threads.push(thread_id);
        }
    }

    pub fn add_watch(&mut self, expression: String) -> String {
        let id = format!("w{}", self.watches.len() + 1);
        self.watches.push(WatchExpression::new(id.clone(), expression));
        id
    }

    pub fn remove_watch(&mut self, id: &str) -> bool {
        let before = self.watches.len();
        self.watches.retain(|w| w.id != id);
        self.watches.len() != before
    }

    pub fn record_watch_result(&mut self, id: &str, frame_id: Option<i64>, result: std::result::Result<String, String>) {
        if let Some(watch) = self.watches.iter_mut().find(|w| w.id == id) {
            watch.last_frame_id = frame_id;
            match result {
                Ok(value) => {
                    watch.last_value = Some(value);
                    watch.last_error = None;
                }
                Err(error) => {
                    watch.last_value = None;
                    watch.last_error = Some(error);
                }
            }
        }
    }

    pub fn set_stop_context(&mut self, ctx: StopContext) {
        self.stop_context = Some(ctx);
    }

    pub fn clear_stop_context(&mut self) {
        self.stop_context = None;
    }

    /// Record the adapter's verdict for one breakpoint after a
    /// `setBreakpoints` round-trip, matched positionally (DAP returns
    /// results in the same order the request sent them).
    pub fn mark_breakpoints_verified(&mut self, source: &str, results: &[(bool, Option<i64>)]) {
        if let Some(bps) = self.breakpoints.get_mut(source) {
            for (bp, (verified, adapter_id)) in bps.iter_mut().zip(results.iter()) {
                bp.verified = *verified;
                bp.adapter_id = *adapter_id;
            }
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
