//! HTTP surface (C12, spec §6): one route per session operation, for
//! callers that prefer plain REST over the tool-call RPC front-end in
//! `mcp/tools/mod.rs`. Both front-ends dispatch to the same
//! `SessionManager`/`DebugSession`, so behavior never diverges between
//! them — this module only translates HTTP <-> the same `Result<Value>`
//! shape `ToolsHandler` produces.

use crate::debug::{buffer::OutputStream, state::DebugState, SessionManager};
use crate::{Error, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
struct AppState {
    sessions: Arc<RwLock<SessionManager>>,
}

/// Wraps `Error` so it can be returned directly from axum handlers via `?`,
/// rendering the envelope spec §7 describes and the status `Error::http_status`
/// assigns.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "error": {
                "kind": self.0.kind(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult = std::result::Result<Json<Value>, ApiError>;

pub fn router(sessions: Arc<RwLock<SessionManager>>) -> Router {
    let state = AppState { sessions };

    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/:id", delete(disconnect_session))
        .route("/sessions/:id/state", get(session_state))
        .route("/sessions/:id/breakpoints", put(set_breakpoints))
        .route("/sessions/:id/breakpoints", get(list_breakpoints))
        .route("/sessions/:id/breakpoints", delete(clear_breakpoints))
        .route("/sessions/:id/continue", post(continue_execution))
        .route("/sessions/:id/pause", post(pause))
        .route("/sessions/:id/step-over", post(step_over))
        .route("/sessions/:id/step-into", post(step_into))
        .route("/sessions/:id/step-out", post(step_out))
        .route("/sessions/:id/stack-trace", get(stack_trace))
        .route("/sessions/:id/scopes", get(scopes))
        .route("/sessions/:id/variables", get(variables))
        .route("/sessions/:id/evaluate", post(evaluate))
        .route("/sessions/:id/smart-inspect", post(smart_inspect))
        .route("/sessions/:id/call-chain", get(call_chain))
        .route("/sessions/:id/watches", post(watch_add))
        .route("/sessions/:id/watches", get(watch_list))
        .route("/sessions/:id/watches/:watch_id", delete(watch_remove))
        .route("/sessions/:id/watches/eval-all", post(watch_eval_all))
        .route("/sessions/:id/events", get(poll_events))
        .route("/sessions/:id/output", get(get_output))
        .route("/containers/:runtime/:container/processes", get(container_list_processes))
        .route("/containers/:runtime/:container/attach", post(container_attach))
        .route("/containers/:runtime/:container/launch", post(container_launch))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct StartBody {
    language: String,
    program: String,
    #[serde(default)]
    args: Vec<String>,
    cwd: Option<String>,
    #[serde(default)]
    stop_on_entry: bool,
}

async fn start_session(State(state): State<AppState>, Json(body): Json<StartBody>) -> ApiResult {
    let manager = state.sessions.read().await;
    let session_id = manager
        .create_session(&body.language, body.program, body.args, body.cwd, body.stop_on_entry)
        .await?;
    Ok(Json(json!({ "sessionId": session_id })))
}

async fn disconnect_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let manager = state.sessions.read().await;
    manager.remove_session(&id).await?;
    Ok(Json(json!({ "status": "disconnected" })))
}

async fn session_state(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let full = session.get_full_state().await;

    let details = match full.state {
        DebugState::Stopped => full
            .stop_context
            .map(|ctx| {
                json!({
                    "threadId": ctx.thread_id,
                    "reason": ctx.reason,
                    "topFrameId": ctx.top_frame_id,
                    "hitBreakpointIds": ctx.hit_breakpoint_ids,
                })
            })
            .unwrap_or_else(|| json!({})),
        DebugState::Failed => json!({ "error": full.failure_reason }),
        _ => json!({}),
    };

    Ok(Json(json!({
        "sessionId": id,
        "state": full.state.as_str(),
        "details": details
    })))
}

#[derive(Debug, Deserialize)]
struct BreakpointSpecBody {
    line: i64,
    condition: Option<String>,
    hit_condition: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SetBreakpointsBody {
    source_path: String,
    breakpoints: Vec<BreakpointSpecBody>,
}

async fn set_breakpoints(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetBreakpointsBody>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;

    let specs = body
        .breakpoints
        .into_iter()
        .map(|b| (b.line, b.condition, b.hit_condition))
        .collect();

    let breakpoints = session.set_breakpoints(body.source_path.clone(), specs).await?;
    let result: Vec<Value> = breakpoints
        .iter()
        .map(|bp| json!({"line": bp.line, "verified": bp.verified, "adapterId": bp.adapter_id}))
        .collect();

    Ok(Json(json!({ "sourcePath": body.source_path, "breakpoints": result })))
}

async fn list_breakpoints(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let full = session.get_full_state().await;

    let mut all = Vec::new();
    for (source_path, bps) in full.breakpoints.iter() {
        for bp in bps {
            all.push(json!({
                "adapterId": bp.adapter_id,
                "verified": bp.verified,
                "line": bp.line,
                "condition": bp.condition,
                "hitCondition": bp.hit_condition,
                "sourcePath": source_path
            }));
        }
    }

    Ok(Json(json!({ "breakpoints": all })))
}

async fn continue_execution(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    session.continue_execution().await?;
    Ok(Json(json!({ "status": "continued" })))
}

async fn clear_breakpoints(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let source_path = query.get("sourcePath").cloned();
    let count = session.clear_breakpoints(source_path).await?;
    Ok(Json(json!({ "cleared": count })))
}

async fn pause(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let thread_id = query.get("threadId").and_then(|s| s.parse::<i32>().ok());
    session.pause(thread_id).await?;
    Ok(Json(json!({ "status": "pausing" })))
}

async fn thread_id_for_step(session: &crate::debug::DebugSession, query: &HashMap<String, String>) -> Result<i32> {
    if let Some(tid) = query.get("threadId").and_then(|s| s.parse::<i32>().ok()) {
        return Ok(tid);
    }
    let full = session.get_full_state().await;
    full.stop_context
        .map(|ctx| ctx.thread_id as i32)
        .ok_or_else(|| Error::FailedPrecondition {
            current: full.state.as_str().to_string(),
            required: "STOPPED".to_string(),
        })
}

async fn step_over(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let thread_id = thread_id_for_step(&session, &query).await?;
    session.step_over(thread_id).await?;
    Ok(Json(json!({ "status": "stepping", "threadId": thread_id })))
}

async fn step_into(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let thread_id = thread_id_for_step(&session, &query).await?;
    session.step_into(thread_id).await?;
    Ok(Json(json!({ "status": "stepping", "threadId": thread_id })))
}

async fn step_out(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let thread_id = thread_id_for_step(&session, &query).await?;
    session.step_out(thread_id).await?;
    Ok(Json(json!({ "status": "stepping", "threadId": thread_id })))
}

async fn stack_trace(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let frames = session.stack_trace().await?;
    Ok(Json(json!({ "stackFrames": frames })))
}

async fn scopes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let frame_id: i32 = query
        .get("frameId")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::InvalidArgument("frameId query parameter is required".to_string()))?;
    let scopes = session.scopes(frame_id).await?;
    Ok(Json(json!({ "scopes": scopes })))
}

async fn variables(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let reference: i32 = query
        .get("ref")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::InvalidArgument("ref query parameter is required".to_string()))?;
    let vars = session.variables(reference).await?;
    Ok(Json(json!({ "variables": vars })))
}

#[derive(Debug, Deserialize)]
struct EvaluateBody {
    expression: String,
    frame_id: Option<i32>,
}

async fn evaluate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EvaluateBody>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let result = session.evaluate(&body.expression, body.frame_id).await?;
    Ok(Json(json!({ "result": result })))
}

async fn smart_inspect(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EvaluateBody>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let inspection = session.smart_inspect(&body.expression, body.frame_id).await?;
    Ok(Json(json!({ "inspection": inspection })))
}

async fn call_chain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let max = query.get("max").and_then(|s| s.parse().ok());
    let frames = session.call_chain(max).await?;
    Ok(Json(json!({ "frames": frames })))
}

#[derive(Debug, Deserialize)]
struct WatchAddBody {
    expression: String,
}

async fn watch_add(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<WatchAddBody>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let watch_id = session.watch_add(body.expression).await;
    Ok(Json(json!({ "id": watch_id })))
}

async fn watch_list(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    Ok(Json(json!({ "watches": session.watch_list().await })))
}

async fn watch_remove(
    State(state): State<AppState>,
    Path((id, watch_id)): Path<(String, String)>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    if !session.watch_remove(&watch_id).await {
        return Err(Error::NotFound { kind: "watch", id: watch_id }.into());
    }
    Ok(Json(json!({ "removed": true })))
}

async fn watch_eval_all(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let frame_id = query.get("frameId").and_then(|s| s.parse().ok());
    let watches = session.watch_eval_all(frame_id).await?;
    Ok(Json(json!({ "watches": watches })))
}

async fn poll_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let since_offset = query.get("sinceOffset").and_then(|s| s.parse().ok()).unwrap_or(0);
    let max = query.get("max").and_then(|s| s.parse().ok());
    let wait_ms = query.get("waitMs").and_then(|s| s.parse().ok()).unwrap_or(0);

    let (records, next_offset, dropped) = session.poll_events(since_offset, max, wait_ms).await;
    Ok(Json(json!({ "events": records, "nextOffset": next_offset, "dropped": dropped })))
}

async fn get_output(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session = manager.get_session(&id).await?;
    let since_offset = query.get("sinceOffset").and_then(|s| s.parse().ok()).unwrap_or(0);
    let max = query.get("max").and_then(|s| s.parse().ok());
    let stream = query.get("stream").map(|s| OutputStream::from_dap_category(s));

    let (records, next_offset, dropped) = session.get_output(stream, since_offset, max).await;
    Ok(Json(json!({ "output": records, "nextOffset": next_offset, "dropped": dropped })))
}

async fn container_list_processes(
    State(state): State<AppState>,
    Path((runtime, container)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let language = query.get("language").cloned().unwrap_or_default();
    let processes = manager
        .list_container_processes(&runtime, &container, &language)
        .await?;

    Ok(Json(json!({
        "processes": processes.iter().map(|p| json!({
            "pid": p.pid,
            "command": p.command,
            "isTargetLanguageCandidate": p.is_target_language_candidate,
        })).collect::<Vec<_>>()
    })))
}

#[derive(Debug, Deserialize)]
struct ContainerAttachBody {
    pid: u32,
    language: String,
}

async fn container_attach(
    State(state): State<AppState>,
    Path((runtime, container)): Path<(String, String)>,
    Json(body): Json<ContainerAttachBody>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session_id = manager
        .create_container_attach_session(&runtime, &container, body.pid, &body.language)
        .await?;
    Ok(Json(json!({ "sessionId": session_id, "status": "attaching" })))
}

#[derive(Debug, Deserialize)]
struct ContainerLaunchBody {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    language: String,
}

async fn container_launch(
    State(state): State<AppState>,
    Path((runtime, container)): Path<(String, String)>,
    Json(body): Json<ContainerLaunchBody>,
) -> ApiResult {
    let manager = state.sessions.read().await;
    let session_id = manager
        .create_container_launch_session(&runtime, &container, body.program, body.args, &body.language)
        .await?;
    Ok(Json(json!({ "sessionId": session_id, "status": "started" })))
}
