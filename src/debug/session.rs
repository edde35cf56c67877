//! Debug Session Management
//!
//! This module implements debug session lifecycle and multi-session coordination.
//!
//! # Architecture Overview
//!
//! ## Single Session Mode (Python, Ruby)
//!
//! Simple 1:1 relationship between MCP session and DAP adapter:
//!
//! ```text
//! DebugSession → DapClient → Adapter (debugpy/rdbg) → User Program
//! ```
//!
//! All debugging operations (breakpoints, stepping, evaluation) go directly through
//! the single DapClient. State changes from the adapter are immediately reflected
//! in the session state.
//!
//! ## Multi-Session Mode (Node.js with vscode-js-debug)
//!
//! Complex parent-child architecture required by vscode-js-debug:
//!
//! ```text
//! DebugSession (parent)
//!   ↓
//!   ├─→ Parent DapClient → vscode-js-debug (port 12345)
//!   │                      ↓ [spawns via startDebugging]
//!   └─→ Child DapClient ──→ vscode-js-debug (SAME port 12345)
//!                          ↓ [launches with __pendingTargetId]
//!                          User Program (actual debugging happens here)
//! ```
//!
//! ### Why Multi-Session?
//!
//! vscode-js-debug uses a **parent-child session model** where:
//! - **Parent**: Coordinates debugging, doesn't run user code
//! - **Child**: Actually runs user code, sends stopped/continued events
//!
//! ### Event Forwarding
//!
//! Child session events (stopped, continued, breakpoint) are forwarded to parent
//! session state so the user sees a unified debugging experience, not separate
//! parent/child sessions. They also land in the parent's event queue and output
//! buffer (C4/C5), which is what `poll_events`/`get_output` read from.
//!
//! # See Also
//!
//! - `src/debug/multi_session.rs` - MultiSessionManager implementation
//! - `src/dap/client.rs` - DapClient with reverse request handling
//! - `src/debug/inspector.rs` - smart_inspect rendering

use super::buffer::{OutputBuffer, OutputRecord, OutputStream};
use super::events::{EventKind, EventQueue, EventRecord};
use super::inspector::{self, ChildFetcher, Inspection};
use super::multi_session::MultiSessionManager;
use super::persistence::{self, PersistedBreakpoint, PersistedSession};
use super::state::{Breakpoint, DebugState, SessionState, StopContext, StopReason};
use crate::dap::client::DapClient;
use crate::dap::types::{Scope, Source, SourceBreakpoint, StackFrame, Variable};
use crate::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Bound at session creation when the broker runs with a data directory
/// (spec §4.8). Recreated and rewritten wholesale on every breakpoint
/// change — the broker only ever persists a handful of sessions, so a
/// partial/incremental update would add complexity for no real gain.
#[derive(Clone)]
struct PersistHandle {
    data_dir: PathBuf,
    project_root: String,
    created_at: chrono::DateTime<chrono::Utc>,
    launch: Option<Value>,
}

/// Session mode - determines how debugging operations are routed
pub enum SessionMode {
    /// Single session mode (Python, Ruby, Go, Rust/native)
    Single { client: Arc<RwLock<DapClient>> },
    /// Multi-session mode (Node.js with vscode-js-debug)
    MultiSession {
        parent_client: Arc<RwLock<DapClient>>,
        multi_session_manager: MultiSessionManager,
        /// Port that vscode-js-debug is listening on (for spawning child connections)
        vscode_js_debug_port: u16,
    },
}

pub struct DebugSession {
    pub id: String,
    pub language: String,
    pub program: String,
    pub session_mode: SessionMode,
    pub(crate) state: Arc<RwLock<SessionState>>,
    pub output: Arc<RwLock<OutputBuffer>>,
    pub events: Arc<EventQueue>,
    last_activity: Arc<RwLock<Instant>>,
    persist: RwLock<Option<PersistHandle>>,
}

/// States from which inspection operations (stack, scopes, variables,
/// evaluate, call-chain, smart-inspect) are valid (spec §3 invariant).
fn require_stopped(state: DebugState) -> Result<()> {
    if state == DebugState::Stopped {
        Ok(())
    } else {
        Err(Error::FailedPrecondition {
            current: state.as_str().to_string(),
            required: "STOPPED".to_string(),
        })
    }
}

/// `pause` is only meaningful while the program is actually executing
/// (spec §4.5: "pause(thread?) requires RUNNING").
fn require_running(state: DebugState) -> Result<()> {
    if state == DebugState::Running {
        Ok(())
    } else {
        Err(Error::FailedPrecondition {
            current: state.as_str().to_string(),
            required: "RUNNING".to_string(),
        })
    }
}

impl DebugSession {
    pub async fn new(language: String, program: String, client: DapClient) -> Result<Self> {
        let id = Uuid::new_v4().to_string();

        Ok(Self {
            id,
            language,
            program,
            session_mode: SessionMode::Single {
                client: Arc::new(RwLock::new(client)),
            },
            state: Arc::new(RwLock::new(SessionState::new())),
            output: Arc::new(RwLock::new(OutputBuffer::new())),
            events: Arc::new(EventQueue::new()),
            last_activity: Arc::new(RwLock::new(Instant::now())),
            persist: RwLock::new(None),
        })
    }

    pub async fn new_with_mode(
        language: String,
        program: String,
        session_mode: SessionMode,
    ) -> Result<Self> {
        let id = Uuid::new_v4().to_string();

        Ok(Self {
            id,
            language,
            program,
            session_mode,
            state: Arc::new(RwLock::new(SessionState::new())),
            output: Arc::new(RwLock::new(OutputBuffer::new())),
            events: Arc::new(EventQueue::new()),
            last_activity: Arc::new(RwLock::new(Instant::now())),
            persist: RwLock::new(None),
        })
    }

    /// Turn on write-through persistence (spec §4.8) for this session.
    /// Called once by `SessionManager::create_session` right after
    /// construction, when the broker was started with a data directory.
    pub async fn enable_persistence(&self, data_dir: PathBuf, project_root: String, launch: Option<Value>) {
        *self.persist.write().await = Some(PersistHandle {
            data_dir,
            project_root,
            created_at: chrono::Utc::now(),
            launch,
        });
        self.persist_now().await;
    }

    /// Write the current breakpoint set to disk if persistence is enabled
    /// for this session. Failures are logged, not propagated — a disk
    /// write failing must never break a live debugging operation.
    async fn persist_now(&self) {
        let handle = self.persist.read().await.clone();
        let Some(handle) = handle else { return };

        let mut persisted = PersistedSession::new(
            self.id.clone(),
            self.language.clone(),
            handle.project_root.clone(),
        );
        persisted.created_at = handle.created_at;
        persisted.launch = handle.launch.clone();
        persisted.breakpoints = {
            let state = self.state.read().await;
            state
                .breakpoints
                .iter()
                .map(|(path, bps)| {
                    (path.clone(), bps.iter().map(PersistedBreakpoint::from).collect())
                })
                .collect()
        };

        if let Err(e) = persistence::write_through(&handle.data_dir, &persisted) {
            warn!("failed to persist session {}: {e}", self.id);
        }
    }

    /// Bump last-activity (spec §4.6: "last-activity updates on every
    /// public operation"), read by the registry's idle sweeper.
    async fn touch(&self) {
        *self.last_activity.write().await = Instant::now();
    }

    pub async fn idle_for(&self) -> std::time::Duration {
        self.last_activity.read().await.elapsed()
    }

    async fn get_debug_client(&self) -> Arc<RwLock<DapClient>> {
        match &self.session_mode {
            SessionMode::Single { client } => client.clone(),
            SessionMode::MultiSession {
                parent_client,
                multi_session_manager,
                ..
            } => multi_session_manager
                .get_active_child()
                .await
                .unwrap_or_else(|| {
                    info!("No active child session, using parent client");
                    parent_client.clone()
                }),
        }
    }

    /// Spawn a child session for multi-session debugging (Node.js vscode-js-debug)
    pub async fn spawn_child_session(&self, target_id: String) -> Result<()> {
        info!("spawning child session for target_id {target_id}");

        let (multi_session_manager, vscode_port) = match &self.session_mode {
            SessionMode::MultiSession {
                multi_session_manager,
                vscode_js_debug_port,
                ..
            } => (multi_session_manager.clone(), *vscode_js_debug_port),
            _ => {
                return Err(Error::FailedPrecondition {
                    current: "single-session".to_string(),
                    required: "multi-session".to_string(),
                });
            }
        };

        let socket = tokio::net::TcpStream::connect(("127.0.0.1", vscode_port))
            .await
            .map_err(|e| {
                Error::Process(format!(
                    "failed to connect to vscode-js-debug port {vscode_port}: {e}"
                ))
            })?;

        let child_client = DapClient::from_socket(socket).await?;

        let child_adapter_id = format!("nodejs-child-{}", &target_id);
        child_client.initialize(&child_adapter_id).await?;

        let launch_args = serde_json::json!({
            "type": "pwa-node",
            "request": "launch",
            "__pendingTargetId": target_id,
        });
        child_client
            .send_request_nowait("launch", Some(launch_args))
            .await?;

        self.register_event_handlers(&child_client).await;

        let entry_line = find_first_executable_line_javascript(&self.program);
        let source = Source {
            path: Some(self.program.clone()),
            name: None,
            source_reference: None,
        };
        let entry_bp = SourceBreakpoint {
            line: entry_line as i32,
            column: None,
            condition: None,
            hit_condition: None,
        };
        match child_client.set_breakpoints(source, vec![entry_bp]).await {
            Ok(verified) if verified.first().map(|b| b.verified).unwrap_or(false) => {
                info!("entry breakpoint verified on child at line {entry_line}");
            }
            Ok(_) => warn!("entry breakpoint could not be verified on child"),
            Err(e) => error!("failed to set entry breakpoint on child: {e}"),
        }

        self.flush_breakpoints(&child_client).await;

        if let Err(e) = child_client.configuration_done().await {
            error!("failed to send configurationDone to child: {e}");
        }

        use super::multi_session::ChildSession;
        let child = ChildSession {
            id: format!("child-{}", &target_id),
            client: Arc::new(RwLock::new(child_client)),
            port: vscode_port,
            session_type: "pwa-node".to_string(),
        };
        multi_session_manager.add_child(child).await;

        info!("child session spawned for target_id {target_id}");
        Ok(())
    }

    /// Wire DAP event callbacks into session state, the event queue and
    /// the output buffer. Shared by both the parent (single-session) path
    /// and each spawned multi-session child.
    async fn register_event_handlers(&self, client: &DapClient) {
        let state = self.state.clone();
        let events = self.events.clone();
        client
            .on_event("stopped", move |event| {
                let state = state.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    if let Some(body) = &event.body {
                        let thread_id = body.get("threadId").and_then(|v| v.as_i64()).unwrap_or(1);
                        let reason = body
                            .get("reason")
                            .and_then(|v| v.as_str())
                            .unwrap_or("unknown");
                        let hit_ids: Vec<i32> = body
                            .get("hitBreakpointIds")
                            .and_then(|v| v.as_array())
                            .map(|a| a.iter().filter_map(|x| x.as_i64().map(|n| n as i32)).collect())
                            .unwrap_or_default();

                        let mut s = state.write().await;
                        s.set_state(DebugState::Stopped);
                        s.set_stop_context(StopContext {
                            thread_id,
                            reason: StopReason::from_dap(reason),
                            top_frame_id: None,
                            hit_breakpoint_ids: hit_ids,
                        });
                        drop(s);
                        events.push(EventKind::Stopped, event.body.clone().unwrap_or(Value::Null));
                    }
                });
            })
            .await;

        let state = self.state.clone();
        let events = self.events.clone();
        client
            .on_event("continued", move |event| {
                let state = state.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    let mut s = state.write().await;
                    s.set_state(DebugState::Running);
                    s.clear_stop_context();
                    drop(s);
                    events.push(EventKind::Continued, event.body.clone().unwrap_or(Value::Null));
                });
            })
            .await;

        let state = self.state.clone();
        let events = self.events.clone();
        client
            .on_event("terminated", move |event| {
                let state = state.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    state.write().await.set_state(DebugState::Terminated);
                    events.push(EventKind::Terminated, event.body.clone().unwrap_or(Value::Null));
                });
            })
            .await;

        let state = self.state.clone();
        let events = self.events.clone();
        client
            .on_event("exited", move |event| {
                let state = state.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    state.write().await.set_state(DebugState::Terminated);
                    events.push(EventKind::Exited, event.body.clone().unwrap_or(Value::Null));
                });
            })
            .await;

        let state = self.state.clone();
        let events = self.events.clone();
        client
            .on_event("thread", move |event| {
                let state = state.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    if let Some(body) = &event.body {
                        if let Some(thread_id) = body.get("threadId").and_then(|v| v.as_i64()) {
                            state.write().await.add_thread(thread_id);
                        }
                    }
                    events.push(EventKind::Thread, event.body.clone().unwrap_or(Value::Null));
                });
            })
            .await;

        let output = self.output.clone();
        let events = self.events.clone();
        client
            .on_event("output", move |event| {
                let output = output.clone();
                let events = events.clone();
                tokio::spawn(async move {
                    if let Some(body) = &event.body {
                        let category = body.get("category").and_then(|v| v.as_str()).unwrap_or("console");
                        let text = body.get("output").and_then(|v| v.as_str()).unwrap_or("");
                        output.write().await.push(OutputStream::from_dap_category(category), text.to_string());
                    }
                    events.push(EventKind::OutputAvailable, event.body.clone().unwrap_or(Value::Null));
                });
            })
            .await;

        let events = self.events.clone();
        client
            .on_event("module", move |event| {
                events.push(EventKind::Module, event.body.clone().unwrap_or(Value::Null));
            })
            .await;
    }

    /// Push every in-memory breakpoint for every source path to the given
    /// client, recording the adapter's verdict back into session state.
    async fn flush_breakpoints(&self, client: &DapClient) {
        let sources: Vec<String> = {
            let state = self.state.read().await;
            state.breakpoints.keys().cloned().collect()
        };
        for path in sources {
            if let Err(e) = self.push_breakpoints_to_adapter(client, &path).await {
                warn!("failed to flush breakpoints for {path}: {e}");
            }
        }
    }

    async fn push_breakpoints_to_adapter(&self, client: &DapClient, source_path: &str) -> Result<()> {
        let bps = {
            let state = self.state.read().await;
            state.get_breakpoints(source_path)
        };
        let source = Source {
            name: None,
            path: Some(source_path.to_string()),
            source_reference: None,
        };
        let dap_bps: Vec<SourceBreakpoint> = bps
            .iter()
            .map(|b| SourceBreakpoint {
                line: b.line as i32,
                column: None,
                condition: b.condition.clone(),
                hit_condition: b.hit_condition.clone(),
            })
            .collect();

        let results = client.set_breakpoints(source, dap_bps).await?;
        let verdicts: Vec<(bool, Option<i64>)> = results
            .iter()
            .map(|r| (r.verified, r.id.map(|i| i as i64)))
            .collect();

        let mut state = self.state.write().await;
        state.mark_breakpoints_verified(source_path, &verdicts);
        Ok(())
    }

    pub async fn initialize_and_launch(
        &self,
        adapter_id: &str,
        launch_args: Value,
    ) -> Result<()> {
        self.state.write().await.set_state(DebugState::Launching);

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        self.register_event_handlers(&client).await;

        let adapter_type = match self.language.as_str() {
            "python" => Some("python"),
            "ruby" => Some("ruby"),
            "nodejs" => Some("nodejs"),
            _ => None,
        };
        client
            .initialize_and_launch_with_timeout(adapter_id, launch_args, adapter_type)
            .await?;

        self.flush_breakpoints(&client).await;

        Ok(())
    }

    /// Same handshake as `initialize_and_launch` but for attaching to an
    /// already-running process (spec §4.10's container bridge).
    pub async fn initialize_and_attach(
        &self,
        adapter_id: &str,
        attach_args: Value,
    ) -> Result<()> {
        self.state.write().await.set_state(DebugState::Launching);

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        self.register_event_handlers(&client).await;

        let adapter_type = match self.language.as_str() {
            "python" => Some("python"),
            "ruby" => Some("ruby"),
            "nodejs" => Some("nodejs"),
            _ => None,
        };
        client
            .initialize_and_attach_with_timeout(adapter_id, attach_args, adapter_type)
            .await?;

        self.flush_breakpoints(&client).await;

        Ok(())
    }

    pub async fn initialize_and_attach_async(self: Arc<Self>, adapter_id: String, attach_args: Value) {
        let session_id = self.id.clone();
        match self.initialize_and_attach(&adapter_id, attach_args).await {
            Ok(()) => info!("session {session_id} initialized and attached"),
            Err(e) => {
                warn!("session {session_id} failed to attach: {e}");
                let mut state = self.state.write().await;
                state.fail(format!("attach failed: {e}"));
                self.events.push(EventKind::Failure, serde_json::json!({"reason": e.to_string()}));
            }
        }
    }

    pub async fn initialize_and_launch_async(self: Arc<Self>, adapter_id: String, launch_args: Value) {
        let session_id = self.id.clone();
        match self.initialize_and_launch(&adapter_id, launch_args).await {
            Ok(()) => info!("session {session_id} initialized and launched"),
            Err(e) => {
                warn!("session {session_id} failed to initialize: {e}");
                let mut state = self.state.write().await;
                state.fail(format!("initialization failed: {e}"));
                self.events.push(EventKind::Failure, serde_json::json!({"reason": e.to_string()}));
            }
        }
    }

    /// Replace the breakpoint set for one source path (spec §8 property
    /// 3: `setBreakpoints` always replaces, never merges). Valid in any
    /// non-terminal state; if the adapter is already attached the change
    /// is pushed immediately, otherwise it is applied on launch.
    pub async fn set_breakpoints(
        &self,
        source_path: String,
        specs: Vec<(i64, Option<String>, Option<String>)>,
    ) -> Result<Vec<Breakpoint>> {
        self.touch().await;
        let current_state = self.state.read().await.state;
        if matches!(current_state, DebugState::Terminated | DebugState::Failed) {
            return Err(Error::FailedPrecondition {
                current: current_state.as_str().to_string(),
                required: "any non-terminal state".to_string(),
            });
        }

        let breakpoints: Vec<Breakpoint> = specs
            .into_iter()
            .map(|(line, condition, hit_condition)| Breakpoint::new(line, condition, hit_condition))
            .collect();

        {
            let mut state = self.state.write().await;
            state.replace_breakpoints(&source_path, breakpoints);
        }

        if current_state != DebugState::Created {
            let client_arc = self.get_debug_client().await;
            let client = client_arc.read().await;
            self.push_breakpoints_to_adapter(&client, &source_path).await?;
        }

        self.persist_now().await;
        Ok(self.state.read().await.get_breakpoints(&source_path))
    }

    /// Clear stored breakpoints for one source path, or every path when
    /// `source_path` is `None` (spec §4.5 `clear_breakpoints`). Valid in
    /// any non-terminal state; pushes the now-empty set(s) to the adapter
    /// immediately when attached, same as `set_breakpoints`.
    pub async fn clear_breakpoints(&self, source_path: Option<String>) -> Result<usize> {
        self.touch().await;
        let current_state = self.state.read().await.state;
        if matches!(current_state, DebugState::Terminated | DebugState::Failed) {
            return Err(Error::FailedPrecondition {
                current: current_state.as_str().to_string(),
                required: "any non-terminal state".to_string(),
            });
        }

        let affected_paths: Vec<String> = match &source_path {
            Some(p) => vec![p.clone()],
            None => {
                let state = self.state.read().await;
                state.breakpoints.keys().cloned().collect()
            }
        };

        let count = {
            let mut state = self.state.write().await;
            state.clear_breakpoints(source_path.as_deref())
        };

        if current_state != DebugState::Created {
            let client_arc = self.get_debug_client().await;
            let client = client_arc.read().await;
            for path in affected_paths {
                if let Err(e) = self.push_breakpoints_to_adapter(&client, &path).await {
                    warn!("failed to clear breakpoints on adapter for {path}: {e}");
                }
            }
        }

        self.persist_now().await;
        Ok(count)
    }

    pub async fn continue_execution(&self) -> Result<()> {
        self.touch().await;
        let thread_id = {
            let state = self.state.read().await;
            require_stopped(state.state)?;
            state
                .stop_context
                .as_ref()
                .map(|c| c.thread_id)
                .or_else(|| state.threads.first().copied())
                .unwrap_or(1) as i32
        };

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.continue_execution(thread_id).await?;

        let mut state = self.state.write().await;
        state.set_state(DebugState::Running);
        state.clear_stop_context();
        Ok(())
    }

    pub async fn step_over(&self, thread_id: i32) -> Result<()> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.next(thread_id).await
    }

    pub async fn step_into(&self, thread_id: i32) -> Result<()> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.step_in(thread_id).await
    }

    pub async fn step_out(&self, thread_id: i32) -> Result<()> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.step_out(thread_id).await
    }

    /// Request the adapter suspend execution on the given thread (or the
    /// first known thread). Requires RUNNING; does not change session
    /// state directly — the adapter's own `stopped` event (reason=pause)
    /// does that (spec §4.5).
    pub async fn pause(&self, thread_id: Option<i32>) -> Result<()> {
        self.touch().await;
        let tid = {
            let state = self.state.read().await;
            require_running(state.state)?;
            thread_id
                .map(|t| t as i64)
                .or_else(|| state.threads.first().copied())
                .unwrap_or(1) as i32
        };

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.pause(tid).await
    }

    async fn current_thread_id(&self) -> i32 {
        let state = self.state.read().await;
        state
            .stop_context
            .as_ref()
            .map(|c| c.thread_id)
            .or_else(|| state.threads.first().copied())
            .unwrap_or(1) as i32
    }

    pub async fn stack_trace(&self) -> Result<Vec<StackFrame>> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let thread_id = self.current_thread_id().await;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.stack_trace(thread_id).await
    }

    pub async fn scopes(&self, frame_id: i32) -> Result<Vec<Scope>> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.scopes(frame_id).await
    }

    pub async fn variables(&self, variables_reference: i32) -> Result<Vec<Variable>> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.variables(variables_reference).await
    }

    pub async fn evaluate(&self, expression: &str, frame_id: Option<i32>) -> Result<String> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;
        client.evaluate(expression, frame_id).await
    }

    /// Render an expression or an existing `variablesReference` as a
    /// structure-aware preview (spec §4.9/C10).
    pub async fn smart_inspect(&self, expression: &str, frame_id: Option<i32>) -> Result<Inspection> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        let evaluated = client.evaluate_full(expression, frame_id).await?;
        let root = Variable {
            name: expression.to_string(),
            value: evaluated.result,
            type_: evaluated.type_,
            variables_reference: evaluated.variables_reference,
            named_variables: evaluated.named_variables,
            indexed_variables: evaluated.indexed_variables,
            presentation_hint: evaluated.presentation_hint,
        };

        struct ClientFetcher<'a>(&'a DapClient);
        #[async_trait::async_trait]
        impl ChildFetcher for ClientFetcher<'_> {
            async fn fetch(&self, variables_reference: i32) -> Result<Vec<Variable>> {
                self.0.variables(variables_reference).await
            }
        }

        inspector::inspect(&root, &ClientFetcher(&client)).await
    }

    /// Stack frames plus an inline ±2 line source context window for
    /// each, fetched lazily from disk (spec §4.5 call_chain).
    pub async fn call_chain(&self, max: Option<usize>) -> Result<Vec<CallChainFrame>> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let frames = self.stack_trace().await?;
        let max = max.unwrap_or(frames.len());

        Ok(frames
            .into_iter()
            .take(max)
            .map(|frame| {
                let context = frame
                    .source
                    .as_ref()
                    .and_then(|s| s.path.as_ref())
                    .and_then(|path| read_context_lines(path, frame.line, 2));
                CallChainFrame { frame, context }
            })
            .collect())
    }

    pub async fn watch_add(&self, expression: String) -> String {
        self.touch().await;
        self.state.write().await.add_watch(expression)
    }

    pub async fn watch_remove(&self, id: &str) -> bool {
        self.touch().await;
        self.state.write().await.remove_watch(id)
    }

    pub async fn watch_list(&self) -> Vec<super::state::WatchExpression> {
        self.touch().await;
        self.state.read().await.watches.clone()
    }

    /// Re-evaluate every watch expression against `frame_id` (spec S3
    /// scenario); each watch records its own value/error independently,
    /// one failing expression never aborts the others.
    pub async fn watch_eval_all(&self, frame_id: Option<i32>) -> Result<Vec<super::state::WatchExpression>> {
        self.touch().await;
        require_stopped(self.state.read().await.state)?;
        let ids: Vec<(String, String)> = self
            .state
            .read()
            .await
            .watches
            .iter()
            .map(|w| (w.id.clone(), w.expression.clone()))
            .collect();

        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        for (id, expression) in ids {
            let result = client
                .evaluate(&expression, frame_id)
                .await
                .map_err(|e| e.to_string());
            self.state
                .write()
                .await
                .record_watch_result(&id, frame_id.map(|f| f as i64), result);
        }

        Ok(self.state.read().await.watches.clone())
    }

    pub async fn poll_events(
        &self,
        since_offset: u64,
        max: Option<usize>,
        wait_ms: u64,
    ) -> (Vec<EventRecord>, u64, u64) {
        self.touch().await;
        self.events.poll(since_offset, max, wait_ms).await
    }

    pub async fn get_output(
        &self,
        stream: Option<OutputStream>,
        since_offset: u64,
        max: Option<usize>,
    ) -> (Vec<OutputRecord>, u64, u64) {
        self.touch().await;
        self.output.read().await.drain_since(since_offset, stream, max)
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.touch().await;
        let client_arc = self.get_debug_client().await;
        let client = client_arc.read().await;

        match client.disconnect_with_timeout().await {
            Ok(_) => info!("disconnect completed for session {}", self.id),
            Err(e) => warn!("disconnect timed out/errored for session {}: {e}, proceeding with cleanup", self.id),
        }

        self.state.write().await.set_state(DebugState::Terminated);
        self.events.push(EventKind::Terminated, Value::Null);
        Ok(())
    }

    pub async fn get_state(&self) -> DebugState {
        self.state.read().await.state
    }

    pub async fn get_full_state(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

/// One frame plus its lazily-read ±`radius` line source window.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CallChainFrame {
    pub frame: StackFrame,
    pub context: Option<String>,
}

/// Find the first executable line in a JS/TS source file, skipping
/// comments, blank lines and bare import/require statements. Mirrors
/// `DapClient::find_first_executable_line_ruby`'s heuristic, adapted to
/// JS/TS syntax for vscode-js-debug's entry breakpoint.
fn find_first_executable_line_javascript(program_path: &str) -> usize {
    let content = match std::fs::read_to_string(program_path) {
        Ok(c) => c,
        Err(e) => {
            warn!("could not read {program_path} for line detection: {e}, using line 1");
            return 1;
        }
    };

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if line_num == 0 && trimmed.starts_with("#!") {
            continue;
        }
        if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
            continue;
        }
        if trimmed.starts_with("import ") || trimmed.starts_with("export default")
            || trimmed.starts_with("require(") || trimmed.starts_with("\"use strict\"")
        {
            continue;
        }
        return line_num + 1;
    }

    1
}

fn read_context_lines(path: &str, line: i32, radius: i64) -> Option<String> {
    if !Path::new(path).exists() {
        return None;
    }
    let contents = std::fs::read_to_string(path).ok()?;
    let lines: Vec<&str> = contents.lines().collect();
    let center = (line as i64 - 1).max(0);
    let start = (center - radius).max(0) as usize;
    let end = ((center + radius) as usize).min(lines.len().saturating_sub(1));
    if start > end || lines.is_empty() {
        return None;
    }
    Some(lines[start..=end].join("\n"))
}
