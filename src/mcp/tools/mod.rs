use crate::debug::SessionManager;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebuggerStartArgs {
    pub language: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<String>,
    #[serde(default)]
    pub stop_on_entry: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointSpec {
    pub line: i64,
    pub condition: Option<String>,
    pub hit_condition: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsArgs {
    pub session_id: String,
    pub source_path: String,
    pub breakpoints: Vec<BreakpointSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearBreakpointsArgs {
    pub session_id: String,
    pub source_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseArgs {
    pub session_id: String,
    pub thread_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerListProcessesArgs {
    pub runtime: String,
    pub container: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAttachArgs {
    pub runtime: String,
    pub container: String,
    pub pid: u32,
    pub language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLaunchArgs {
    pub runtime: String,
    pub container: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub language: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopesArgs {
    pub session_id: String,
    pub frame_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesArgs {
    pub session_id: String,
    pub variables_reference: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateArgs {
    pub session_id: String,
    pub expression: String,
    pub frame_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartInspectArgs {
    pub session_id: String,
    pub expression: String,
    pub frame_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallChainArgs {
    pub session_id: String,
    pub max: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchAddArgs {
    pub session_id: String,
    pub expression: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRemoveArgs {
    pub session_id: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchListArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEvalAllArgs {
    pub session_id: String,
    pub frame_id: Option<i32>,
}

fn default_offset() -> u64 {
    0
}

fn default_wait_ms() -> u64 {
    0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollEventsArgs {
    pub session_id: String,
    #[serde(default = "default_offset")]
    pub since_offset: u64,
    pub max: Option<usize>,
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOutputArgs {
    pub session_id: String,
    pub stream: Option<String>,
    #[serde(default = "default_offset")]
    pub since_offset: u64,
    pub max: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitForStopArgs {
    pub session_id: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_timeout() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBreakpointsArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepArgs {
    pub session_id: String,
    pub thread_id: Option<i32>,
}

pub struct ToolsHandler {
    session_manager: Arc<RwLock<SessionManager>>,
}

impl ToolsHandler {
    pub fn new(session_manager: Arc<RwLock<SessionManager>>) -> Self {
        Self { session_manager }
    }

    pub async fn handle_tool(&self, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "debugger_start" => self.debugger_start(arguments).await,
            "debugger_session_state" => self.debugger_session_state(arguments).await,
            "debugger_set_breakpoints" => self.debugger_set_breakpoints(arguments).await,
            "debugger_clear_breakpoints" => self.debugger_clear_breakpoints(arguments).await,
            "debugger_continue" => self.debugger_continue(arguments).await,
            "debugger_pause" => self.debugger_pause(arguments).await,
            "debugger_stack_trace" => self.debugger_stack_trace(arguments).await,
            "debugger_scopes" => self.debugger_scopes(arguments).await,
            "debugger_variables" => self.debugger_variables(arguments).await,
            "debugger_evaluate" => self.debugger_evaluate(arguments).await,
            "debugger_smart_inspect" => self.debugger_smart_inspect(arguments).await,
            "debugger_call_chain" => self.debugger_call_chain(arguments).await,
            "debugger_watch_add" => self.debugger_watch_add(arguments).await,
            "debugger_watch_remove" => self.debugger_watch_remove(arguments).await,
            "debugger_watch_list" => self.debugger_watch_list(arguments).await,
            "debugger_watch_eval_all" => self.debugger_watch_eval_all(arguments).await,
            "debugger_poll_events" => self.debugger_poll_events(arguments).await,
            "debugger_get_output" => self.debugger_get_output(arguments).await,
            "debugger_disconnect" => self.debugger_disconnect(arguments).await,
            "debugger_wait_for_stop" => self.debugger_wait_for_stop(arguments).await,
            "debugger_list_breakpoints" => self.debugger_list_breakpoints(arguments).await,
            "debugger_step_over" => self.debugger_step_over(arguments).await,
            "debugger_step_into" => self.debugger_step_into(arguments).await,
            "debugger_step_out" => self.debugger_step_out(arguments).await,
            "container_list_processes" => self.container_list_processes(arguments).await,
            "container_attach" => self.container_attach(arguments).await,
            "container_launch" => self.container_launch(arguments).await,
            _ => Err(Error::MethodNotFound(name.to_string())),
        }
    }

    async fn debugger_start(&self, arguments: Value) -> Result<Value> {
        let args: DebuggerStartArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session_id = manager
            .create_session(
                &args.language,
                args.program,
                args.args,
                args.cwd,
                args.stop_on_entry,
            )
            .await?;

        Ok(json!({
            "sessionId": session_id,
            "status": "started"
        }))
    }

    /// JSON-friendly view of `SessionState` (spec §3: state plus whichever
    /// of `stop_context`/`failure_reason` applies).
    fn state_details(full_state: &crate::debug::state::SessionState) -> Value {
        match full_state.state {
            crate::debug::state::DebugState::Stopped => full_state
                .stop_context
                .as_ref()
                .map(|ctx| {
                    json!({
                        "threadId": ctx.thread_id,
                        "reason": ctx.reason,
                        "topFrameId": ctx.top_frame_id,
                        "hitBreakpointIds": ctx.hit_breakpoint_ids,
                    })
                })
                .unwrap_or_else(|| json!({})),
            crate::debug::state::DebugState::Failed => json!({
                "error": full_state.failure_reason,
            }),
            _ => json!({}),
        }
    }

    async fn debugger_session_state(&self, arguments: Value) -> Result<Value> {
        let args: SessionStateArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;
        let full_state = session.get_full_state().await;

        Ok(json!({
            "sessionId": args.session_id,
            "state": full_state.state.as_str(),
            "details": Self::state_details(&full_state)
        }))
    }

    async fn debugger_set_breakpoints(&self, arguments: Value) -> Result<Value> {
        let args: SetBreakpointsArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let specs = args
            .breakpoints
            .into_iter()
            .map(|b| (b.line, b.condition, b.hit_condition))
            .collect();

        let breakpoints = session
            .set_breakpoints(args.source_path.clone(), specs)
            .await?;

        let result: Vec<Value> = breakpoints
            .iter()
            .map(|bp| {
                json!({
                    "line": bp.line,
                    "verified": bp.verified,
                    "adapterId": bp.adapter_id,
                })
            })
            .collect();

        Ok(json!({
            "sourcePath": args.source_path,
            "breakpoints": result
        }))
    }

    async fn debugger_clear_breakpoints(&self, arguments: Value) -> Result<Value> {
        let args: ClearBreakpointsArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let count = session.clear_breakpoints(args.source_path).await?;

        Ok(json!({
            "cleared": count
        }))
    }

    async fn debugger_continue(&self, arguments: Value) -> Result<Value> {
        let args: ContinueArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        session.continue_execution().await?;

        Ok(json!({
            "status": "continued"
        }))
    }

    async fn debugger_pause(&self, arguments: Value) -> Result<Value> {
        let args: PauseArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        session.pause(args.thread_id).await?;

        Ok(json!({
            "status": "pausing"
        }))
    }

    /// Enumerate processes inside a container/pod (spec §4.10/C11).
    async fn container_list_processes(&self, arguments: Value) -> Result<Value> {
        let args: ContainerListProcessesArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let processes = manager
            .list_container_processes(&args.runtime, &args.container, &args.language)
            .await?;

        Ok(json!({
            "processes": processes.iter().map(|p| json!({
                "pid": p.pid,
                "command": p.command,
                "isTargetLanguageCandidate": p.is_target_language_candidate,
            })).collect::<Vec<_>>()
        }))
    }

    /// Inject a debug stub against a running in-container process and
    /// attach a session to it (spec §4.10/C11).
    async fn container_attach(&self, arguments: Value) -> Result<Value> {
        let args: ContainerAttachArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session_id = manager
            .create_container_attach_session(&args.runtime, &args.container, args.pid, &args.language)
            .await?;

        Ok(json!({
            "sessionId": session_id,
            "status": "attaching"
        }))
    }

    /// Launch a program directly inside a container (no attach stub),
    /// spec §4.10/C11.
    async fn container_launch(&self, arguments: Value) -> Result<Value> {
        let args: ContainerLaunchArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session_id = manager
            .create_container_launch_session(&args.runtime, &args.container, args.program, args.args, &args.language)
            .await?;

        Ok(json!({
            "sessionId": session_id,
            "status": "started"
        }))
    }

    async fn debugger_stack_trace(&self, arguments: Value) -> Result<Value> {
        let args: StackTraceArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let frames = session.stack_trace().await?;

        Ok(json!({
            "stackFrames": frames
        }))
    }

    async fn debugger_scopes(&self, arguments: Value) -> Result<Value> {
        let args: ScopesArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let scopes = session.scopes(args.frame_id).await?;

        Ok(json!({
            "scopes": scopes
        }))
    }

    async fn debugger_variables(&self, arguments: Value) -> Result<Value> {
        let args: VariablesArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let variables = session.variables(args.variables_reference).await?;

        Ok(json!({
            "variables": variables
        }))
    }

    async fn debugger_evaluate(&self, arguments: Value) -> Result<Value> {
        let args: EvaluateArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let result = session.evaluate(&args.expression, args.frame_id).await?;

        Ok(json!({
            "result": result
        }))
    }

    async fn debugger_smart_inspect(&self, arguments: Value) -> Result<Value> {
        let args: SmartInspectArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let inspection = session
            .smart_inspect(&args.expression, args.frame_id)
            .await?;

        Ok(json!({
            "inspection": inspection
        }))
    }

    async fn debugger_call_chain(&self, arguments: Value) -> Result<Value> {
        let args: CallChainArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let frames = session.call_chain(args.max).await?;

        Ok(json!({
            "frames": frames
        }))
    }

    async fn debugger_watch_add(&self, arguments: Value) -> Result<Value> {
        let args: WatchAddArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let id = session.watch_add(args.expression).await;

        Ok(json!({ "id": id }))
    }

    async fn debugger_watch_remove(&self, arguments: Value) -> Result<Value> {
        let args: WatchRemoveArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        if !session.watch_remove(&args.id).await {
            return Err(Error::NotFound {
                kind: "watch",
                id: args.id,
            });
        }

        Ok(json!({ "removed": true }))
    }

    async fn debugger_watch_list(&self, arguments: Value) -> Result<Value> {
        let args: WatchListArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        Ok(json!({ "watches": session.watch_list().await }))
    }

    async fn debugger_watch_eval_all(&self, arguments: Value) -> Result<Value> {
        let args: WatchEvalAllArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let watches = session.watch_eval_all(args.frame_id).await?;

        Ok(json!({ "watches": watches }))
    }

    async fn debugger_poll_events(&self, arguments: Value) -> Result<Value> {
        let args: PollEventsArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let (records, next_offset, dropped) = session
            .poll_events(args.since_offset, args.max, args.wait_ms)
            .await;

        Ok(json!({
            "events": records,
            "nextOffset": next_offset,
            "dropped": dropped
        }))
    }

    async fn debugger_get_output(&self, arguments: Value) -> Result<Value> {
        let args: GetOutputArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let stream = args
            .stream
            .as_deref()
            .map(crate::debug::buffer::OutputStream::from_dap_category);

        let (records, next_offset, dropped) = session
            .get_output(stream, args.since_offset, args.max)
            .await;

        Ok(json!({
            "output": records,
            "nextOffset": next_offset,
            "dropped": dropped
        }))
    }

    async fn debugger_wait_for_stop(&self, arguments: Value) -> Result<Value> {
        let args: WaitForStopArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let timeout = tokio::time::Duration::from_millis(args.timeout_ms);
        let start = tokio::time::Instant::now();

        loop {
            let full_state = session.get_full_state().await;

            match full_state.state {
                crate::debug::state::DebugState::Stopped => {
                    let ctx = full_state.stop_context;
                    return Ok(json!({
                        "state": "STOPPED",
                        "threadId": ctx.as_ref().map(|c| c.thread_id),
                        "reason": ctx.as_ref().map(|c| c.reason)
                    }));
                }
                crate::debug::state::DebugState::Terminated => {
                    return Ok(json!({
                        "state": "TERMINATED",
                        "reason": "Program exited"
                    }));
                }
                crate::debug::state::DebugState::Failed => {
                    return Err(Error::AdapterError {
                        command: "launch".to_string(),
                        message: full_state
                            .failure_reason
                            .unwrap_or_else(|| "unknown failure".to_string()),
                    });
                }
                _ => {}
            }

            if start.elapsed() > timeout {
                return Err(Error::Timeout(format!(
                    "waiting for session {} to stop",
                    args.session_id
                )));
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    }

    async fn debugger_list_breakpoints(&self, arguments: Value) -> Result<Value> {
        let args: ListBreakpointsArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let full_state = session.get_full_state().await;

        let mut all_breakpoints = Vec::new();
        for (source_path, breakpoints) in full_state.breakpoints.iter() {
            for bp in breakpoints {
                all_breakpoints.push(json!({
                    "adapterId": bp.adapter_id,
                    "verified": bp.verified,
                    "line": bp.line,
                    "condition": bp.condition,
                    "hitCondition": bp.hit_condition,
                    "sourcePath": source_path
                }));
            }
        }

        Ok(json!({
            "breakpoints": all_breakpoints
        }))
    }

    async fn thread_id_for_step(&self, session: &crate::debug::DebugSession, requested: Option<i32>) -> Result<i32> {
        if let Some(tid) = requested {
            return Ok(tid);
        }
        let full_state = session.get_full_state().await;
        full_state
            .stop_context
            .map(|ctx| ctx.thread_id as i32)
            .ok_or_else(|| Error::FailedPrecondition {
                current: full_state.state.as_str().to_string(),
                required: "STOPPED".to_string(),
            })
    }

    async fn debugger_step_over(&self, arguments: Value) -> Result<Value> {
        let args: StepArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let thread_id = self.thread_id_for_step(&session, args.thread_id).await?;
        session.step_over(thread_id).await?;

        Ok(json!({
            "status": "stepping",
            "threadId": thread_id
        }))
    }

    async fn debugger_step_into(&self, arguments: Value) -> Result<Value> {
        let args: StepArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let thread_id = self.thread_id_for_step(&session, args.thread_id).await?;
        session.step_into(thread_id).await?;

        Ok(json!({
            "status": "stepping",
            "threadId": thread_id
        }))
    }

    async fn debugger_step_out(&self, arguments: Value) -> Result<Value> {
        let args: StepArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        let session = manager.get_session(&args.session_id).await?;

        let thread_id = self.thread_id_for_step(&session, args.thread_id).await?;
        session.step_out(thread_id).await?;

        Ok(json!({
            "status": "stepping",
            "threadId": thread_id
        }))
    }

    async fn debugger_disconnect(&self, arguments: Value) -> Result<Value> {
        let args: DisconnectArgs = serde_json::from_value(arguments)?;

        let manager = self.session_manager.read().await;
        manager.remove_session(&args.session_id).await?;

        Ok(json!({
            "status": "disconnected"
        }))
    }

    pub fn list_tools() -> Vec<Value> {
        vec![
            json!({
                "name": "debugger_start",
                "title": "Start Debugging Session",
                "description": "Starts a new debugging session for a program. RETURNS IMMEDIATELY with a sessionId while initialization happens asynchronously in the background.\n\nIMPORTANT WORKFLOW:\n1. Call this tool first to create a session\n2. Use debugger_wait_for_stop to wait for entry point (if stopOnEntry: true)\n3. Once stopped, set breakpoints with debugger_set_breakpoints\n4. Control execution with debugger_continue\n\nTIMING: Returns in <100ms. Background initialization takes 200-500ms.\n\n⭐ CRITICAL: stopOnEntry Parameter\n=================================\nFor reliable breakpoint debugging, ALWAYS use stopOnEntry: true:\n\n✅ RECOMMENDED (with stopOnEntry: true):\n  - Program pauses at first executable line\n  - Gives you time to set breakpoints before execution\n  - Prevents program from completing before breakpoints are set\n\n❌ NOT RECOMMENDED (stopOnEntry: false or omitted):\n  - Program runs immediately upon start\n  - May complete before breakpoints can be set\n\nEXAMPLE WORKFLOW:\n  debugger_start({language: \"python\", program: \"app.py\", stopOnEntry: true})\n  debugger_wait_for_stop()  // Wait for entry point\n  debugger_set_breakpoints({sourcePath: \"app.py\", breakpoints: [{line: 20}]})\n  debugger_continue()  // Now resume to breakpoint\n\nSEE ALSO: debugger_wait_for_stop, debugger_session_state, debugger://workflows",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "language": {
                            "type": "string",
                            "description": "Programming language: 'python' (or 'py'), 'nodejs' (or 'js'/'ts'), 'go', 'rust' (also covers C/C++ via LLDB, or 'native'), plus 'ruby'"
                        },
                        "program": {
                            "type": "string",
                            "description": "Absolute or relative path to the program file to debug"
                        },
                        "args": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Command-line arguments passed to the program (optional, defaults to empty array)"
                        },
                        "cwd": {
                            "type": "string",
                            "description": "Working directory for the program execution (optional, defaults to program's directory)"
                        },
                        "stopOnEntry": {
                            "type": "boolean",
                            "description": "If true, pauses execution at the program's first line (recommended for setting early breakpoints)"
                        }
                    },
                    "required": ["language", "program"]
                },
                "annotations": {
                    "async": true,
                    "returnsTiming": "< 100ms",
                    "completionTiming": "200-500ms (background)",
                    "workflow": "initialization",
                    "requiredFollowUp": ["debugger_session_state"],
                    "category": "session-management",
                    "priority": 1.0
                }
            }),
            json!({
                "name": "debugger_session_state",
                "title": "Check Session State",
                "description": "Retrieves the current state of a debugging session. Essential for tracking async initialization progress.\n\nSTATES: CREATED, LAUNCHING, RUNNING, STOPPED, TERMINATED, FAILED.\n\nWhen STOPPED, details.reason explains why (breakpoint, step, pause, exception, entry) and details.threadId names the stopped thread. When FAILED, details.error carries the failure message.\n\nTIMING: Returns immediately (<10ms)\n\nSEE ALSO: debugger://state-machine, debugger_wait_for_stop (blocking alternative to polling)",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": {
                            "type": "string",
                            "description": "Session ID returned from debugger_start"
                        }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "returnsTiming": "< 10ms",
                    "workflow": "state-checking",
                    "category": "session-management",
                    "pollable": true,
                    "priority": 0.9
                }
            }),
            json!({
                "name": "debugger_set_breakpoints",
                "title": "Set Breakpoints",
                "description": "Replaces the full breakpoint set for one source file. Calling this again for the same sourcePath replaces the previous set entirely; it never merges.\n\nEach breakpoint may carry an optional condition (evaluated expression, language-specific syntax) and hitCondition (e.g. '>= 3').\n\nValid in any non-terminal session state. If the adapter is already attached, the change takes effect immediately; otherwise it applies once the program launches.\n\nRETURNS: breakpoints array with each entry's verified flag and adapter-assigned id.\n\nSEE ALSO: debugger_continue, debugger_list_breakpoints",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": {
                            "type": "string",
                            "description": "Session ID from debugger_start"
                        },
                        "sourcePath": {
                            "type": "string",
                            "description": "Absolute or relative path to the source file (must match debugger's path resolution)"
                        },
                        "breakpoints": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "line": { "type": "integer", "description": "1-indexed line number" },
                                    "condition": { "type": "string", "description": "Optional conditional expression" },
                                    "hitCondition": { "type": "string", "description": "Optional hit-count expression" }
                                },
                                "required": ["line"]
                            }
                        }
                    },
                    "required": ["sessionId", "sourcePath", "breakpoints"]
                },
                "annotations": {
                    "async": false,
                    "returnsTiming": "5-20ms",
                    "workflow": "breakpoint-management",
                    "category": "debugging",
                    "priority": 0.8
                }
            }),
            json!({
                "name": "debugger_clear_breakpoints",
                "title": "Clear Breakpoints",
                "description": "Removes stored breakpoints. If sourcePath is given, clears only that file's breakpoints; otherwise clears every file's breakpoints for this session.\n\nValid in any non-terminal session state. If the adapter is already attached, the change takes effect immediately.\n\nRETURNS: {\"cleared\": <count>}\n\nSEE ALSO: debugger_set_breakpoints, debugger_list_breakpoints",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "sourcePath": { "type": "string", "description": "Optional path to clear; omit to clear all paths" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "returnsTiming": "5-20ms",
                    "workflow": "breakpoint-management",
                    "category": "debugging",
                    "priority": 0.75
                }
            }),
            json!({
                "name": "debugger_continue",
                "title": "Continue Execution",
                "description": "Resumes program execution after being paused. Execution continues until the next breakpoint, exception, or program termination.\n\nREQUIRES: session state STOPPED.\n\nRETURNS: {\"status\": \"continued\"}\n\nSEE ALSO: debugger_wait_for_stop, debugger_stack_trace",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": true,
                    "returnsTiming": "< 10ms",
                    "workflow": "execution-control",
                    "category": "debugging",
                    "requiresState": ["STOPPED"],
                    "priority": 0.7
                }
            }),
            json!({
                "name": "debugger_pause",
                "title": "Pause Execution",
                "description": "Requests the adapter suspend a running program. The session transitions to STOPPED (reason=pause) once the adapter's `stopped` event arrives; poll debugger_session_state or debugger_wait_for_stop afterwards.\n\nREQUIRES: session state RUNNING.\n\nRETURNS: {\"status\": \"pausing\"}\n\nSEE ALSO: debugger_wait_for_stop, debugger_continue",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "threadId": { "type": "integer", "description": "Optional thread to pause; defaults to the first known thread" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": true,
                    "returnsTiming": "< 10ms",
                    "workflow": "execution-control",
                    "category": "debugging",
                    "requiresState": ["RUNNING"],
                    "priority": 0.65
                }
            }),
            json!({
                "name": "debugger_stack_trace",
                "title": "Get Stack Trace",
                "description": "Retrieves the current call stack when execution is paused. The 'id' field of each frame is used as frameId with debugger_evaluate/debugger_scopes/debugger_call_chain.\n\n⚠️ Frame IDs change after every stop; always fetch a fresh stack trace after each debugger_wait_for_stop.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "returnsTiming": "10-50ms",
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"],
                    "priority": 0.6
                }
            }),
            json!({
                "name": "debugger_scopes",
                "title": "Get Scopes For A Frame",
                "description": "Lists the variable scopes (locals, arguments, globals, ...) available in a stack frame. Each scope's variablesReference is passed to debugger_variables to expand it.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "frameId": { "type": "integer", "description": "Frame ID from debugger_stack_trace" }
                    },
                    "required": ["sessionId", "frameId"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"]
                }
            }),
            json!({
                "name": "debugger_variables",
                "title": "Expand A Variables Reference",
                "description": "Expands a scope or a compound variable's variablesReference into its child name/value pairs. Value previews are bounded (default 256 chars); use debugger_smart_inspect for structure-aware rendering of large values.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "variablesReference": { "type": "integer", "description": "Reference from debugger_scopes or a parent debugger_variables call" }
                    },
                    "required": ["sessionId", "variablesReference"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"]
                }
            }),
            json!({
                "name": "debugger_evaluate",
                "title": "Evaluate Expression",
                "description": "Evaluates an expression in the context of the paused program.\n\n⚠️ frameId is required in practice to access local variables; without it the expression evaluates in a global/default context.\n\nWORKFLOW:\n1. debugger_stack_trace to get a fresh frame ID\n2. debugger_evaluate with that frameId\n\nREQUIRES: session state STOPPED.\n\nRETURNS: {\"result\": \"string representation\"}",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "expression": { "type": "string", "description": "Expression to evaluate (syntax depends on the debugged language)" },
                        "frameId": { "type": "integer", "description": "Stack frame ID from debugger_stack_trace (optional, defaults to current frame)" }
                    },
                    "required": ["sessionId", "expression"]
                },
                "annotations": {
                    "async": false,
                    "returnsTiming": "20-200ms",
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"],
                    "priority": 0.5
                }
            }),
            json!({
                "name": "debugger_smart_inspect",
                "title": "Structure-Aware Inspect",
                "description": "Evaluates an expression and renders it as a structured preview classified by shape: tabular (dataframe-like), ndarray, mapping, sequence, or scalar. Bounds the number of child fetches regardless of the value's apparent size, expanding lazily rather than eagerly.\n\nUse this over debugger_evaluate/debugger_variables when you want a shape-aware summary instead of a raw string or a flat variable list.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "expression": { "type": "string", "description": "Expression to evaluate and classify" },
                        "frameId": { "type": "integer", "description": "Stack frame ID from debugger_stack_trace (optional)" }
                    },
                    "required": ["sessionId", "expression"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"]
                }
            }),
            json!({
                "name": "debugger_call_chain",
                "title": "Call Chain With Source Context",
                "description": "Returns the current stack frames plus an inline ±2 line source window for each frame, read lazily from disk. Saves a round-trip compared to separately reading source files for every frame in debugger_stack_trace.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "max": { "type": "integer", "description": "Maximum number of frames to return, innermost first (optional, defaults to the full stack)" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"]
                }
            }),
            json!({
                "name": "debugger_watch_add",
                "title": "Add Watch Expression",
                "description": "Registers an expression to be re-evaluated on demand via debugger_watch_eval_all. Returns a watch id.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "expression": { "type": "string", "description": "Expression to watch" }
                    },
                    "required": ["sessionId", "expression"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging"
                }
            }),
            json!({
                "name": "debugger_watch_remove",
                "title": "Remove Watch Expression",
                "description": "Unregisters a previously added watch expression by id.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "id": { "type": "string", "description": "Watch id from debugger_watch_add" }
                    },
                    "required": ["sessionId", "id"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging"
                }
            }),
            json!({
                "name": "debugger_watch_list",
                "title": "List Watch Expressions",
                "description": "Lists all registered watch expressions with their most recently recorded value or error.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging"
                }
            }),
            json!({
                "name": "debugger_watch_eval_all",
                "title": "Re-evaluate All Watches",
                "description": "Re-evaluates every registered watch expression against a frame. Each watch records its own value or error independently; one failing expression does not prevent the others from evaluating.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "frameId": { "type": "integer", "description": "Stack frame ID to evaluate against (optional)" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging",
                    "requiresState": ["STOPPED"]
                }
            }),
            json!({
                "name": "debugger_poll_events",
                "title": "Poll Session Events",
                "description": "Returns session event records (stopped, continued, terminated, thread, output-available, breakpoint-changed, module, failure) with offset greater than sinceOffset.\n\nIf waitMs > 0 and no records are immediately available, blocks up to that long for the first record to arrive rather than requiring the caller to sleep-and-poll.\n\nThe event queue is bounded; 'dropped' reports how many records have been evicted since the session started.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "sinceOffset": { "type": "integer", "description": "Return only records with offset greater than this (default 0)" },
                        "max": { "type": "integer", "description": "Maximum number of records to return (optional)" },
                        "waitMs": { "type": "integer", "description": "Block up to this many milliseconds if no records are immediately available (default 0)" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": true,
                    "workflow": "event-polling",
                    "category": "debugging"
                }
            }),
            json!({
                "name": "debugger_get_output",
                "title": "Get Program Output",
                "description": "Returns stdout/stderr/console/telemetry output fragments from the debugged program with offset greater than sinceOffset, optionally filtered to a single stream.\n\nThe output buffer is bounded by both record count and total bytes; 'dropped' reports how many records have been evicted since the session started.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "stream": { "type": "string", "enum": ["stdout", "stderr", "console", "telemetry"], "description": "Restrict to one output stream (optional, default: all streams)" },
                        "sinceOffset": { "type": "integer", "description": "Return only records with offset greater than this (default 0)" },
                        "max": { "type": "integer", "description": "Maximum number of records to return (optional)" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "inspection",
                    "category": "debugging"
                }
            }),
            json!({
                "name": "debugger_disconnect",
                "title": "Disconnect Session",
                "description": "Terminates a debugging session and cleans up all associated resources. The debugged program will be stopped if still running.\n\nRETURNS: {\"status\": \"disconnected\"}",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" }
                    },
                    "required": ["sessionId"]
                },
                "annotations": {
                    "async": false,
                    "returnsTiming": "50-200ms",
                    "workflow": "cleanup",
                    "category": "session-management",
                    "destructive": true,
                    "priority": 0.4
                }
            }),
            json!({
                "name": "debugger_wait_for_stop",
                "title": "Wait For Program To Stop",
                "description": "Blocks until the debugger stops (breakpoint, step, pause, exception, entry) or terminates, or times out. More efficient than polling debugger_session_state.\n\nRETURNS:\n{\"state\": \"STOPPED\", \"threadId\": 1, \"reason\": \"breakpoint\"}\nor {\"state\": \"TERMINATED\", ...} if the program exited while waiting.\n\nSEE ALSO: debugger_session_state, debugger_continue",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "timeoutMs": {
                            "type": "integer",
                            "default": 5000,
                            "description": "Maximum time to wait in milliseconds (default: 5000)"
                        }
                    },
                    "required": ["sessionId"]
                }
            }),
            json!({
                "name": "debugger_list_breakpoints",
                "title": "List All Breakpoints",
                "description": "Lists all breakpoints currently set across all source files, with their verification status.\n\nRETURNS: Array of breakpoints with adapterId, verified, line, condition, hitCondition, and sourcePath",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" }
                    },
                    "required": ["sessionId"]
                }
            }),
            json!({
                "name": "debugger_step_over",
                "title": "Step Over (Next Line)",
                "description": "Executes the current line and stops at the next line. Does NOT step into function calls.\n\nREQUIRES: session state STOPPED.\n\nSEE ALSO: debugger_step_into, debugger_step_out",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "threadId": { "type": "integer", "description": "Thread ID (optional, uses the stopped thread if not specified)" }
                    },
                    "required": ["sessionId"]
                }
            }),
            json!({
                "name": "debugger_step_into",
                "title": "Step Into (Enter Function)",
                "description": "Steps into function calls on the current line. If there is no function call, behaves like debugger_step_over.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "threadId": { "type": "integer", "description": "Thread ID (optional)" }
                    },
                    "required": ["sessionId"]
                }
            }),
            json!({
                "name": "debugger_step_out",
                "title": "Step Out (Exit Function)",
                "description": "Continues execution until the current function returns, then stops at the caller.\n\nREQUIRES: session state STOPPED.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "sessionId": { "type": "string", "description": "Session ID from debugger_start" },
                        "threadId": { "type": "integer", "description": "Thread ID (optional)" }
                    },
                    "required": ["sessionId"]
                }
            }),
            json!({
                "name": "container_list_processes",
                "title": "List Container Processes",
                "description": "Enumerates processes running inside a container/pod, tagging each as a plausible attach target for the given language.\n\nRETURNS: {\"processes\": [{\"pid\", \"command\", \"isTargetLanguageCandidate\"}, ...]}\n\nSEE ALSO: container_attach",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "runtime": { "type": "string", "description": "docker, podman, or kubernetes" },
                        "container": { "type": "string", "description": "Container name (or pod name for kubernetes)" },
                        "language": { "type": "string", "description": "Spec language tag used to flag attach candidates" }
                    },
                    "required": ["runtime", "container", "language"]
                },
                "annotations": {
                    "async": false,
                    "workflow": "container-debugging",
                    "category": "debugging",
                    "priority": 0.4
                }
            }),
            json!({
                "name": "container_attach",
                "title": "Attach to In-Container Process",
                "description": "Injects a debug stub against a running process inside a container and attaches a new debug session to it over a port-forwarded loopback socket.\n\nRETURNS: {\"sessionId\": <id>, \"status\": \"attaching\"}\n\nSEE ALSO: container_list_processes, debugger_wait_for_stop",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "runtime": { "type": "string", "description": "docker, podman, or kubernetes" },
                        "container": { "type": "string", "description": "Container name (or pod name for kubernetes)" },
                        "pid": { "type": "integer", "description": "Target process id inside the container, from container_list_processes" },
                        "language": { "type": "string", "description": "Spec language tag selecting the debug stub" }
                    },
                    "required": ["runtime", "container", "pid", "language"]
                },
                "annotations": {
                    "async": true,
                    "workflow": "container-debugging",
                    "category": "debugging",
                    "priority": 0.4
                }
            }),
            json!({
                "name": "container_launch",
                "title": "Launch Program In Container",
                "description": "Launches a program directly inside a container with stdio wired through the runtime CLI, no attach stub. Only meaningful for a program that itself speaks the Debug Adapter Protocol over stdio.\n\nRETURNS: {\"sessionId\": <id>, \"status\": \"started\"}",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "runtime": { "type": "string", "description": "docker, podman, or kubernetes" },
                        "container": { "type": "string", "description": "Container name (or pod name for kubernetes)" },
                        "program": { "type": "string", "description": "Path to the program to launch inside the container" },
                        "args": { "type": "array", "items": { "type": "string" }, "description": "Program arguments" },
                        "language": { "type": "string", "description": "Spec language tag" }
                    },
                    "required": ["runtime", "container", "program", "language"]
                },
                "annotations": {
                    "async": true,
                    "workflow": "container-debugging",
                    "category": "debugging",
                    "priority": 0.35
                }
            }),
        ]
    }
}
