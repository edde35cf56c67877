use crate::{Error, Result};
use crate::adapters::python::PythonAdapter;
use crate::adapters::ruby::RubyAdapter;
use crate::adapters::golang::GoAdapter;
use crate::adapters::nodejs::NodeJsAdapter;
use crate::adapters::rust::RustAdapter;
use crate::adapters::logging::DebugAdapterLogger;
use crate::dap::client::DapClient;
use super::session::DebugSession;
use super::state::DebugState;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const DEFAULT_MAX_SESSIONS: usize = 10;
const DEFAULT_SESSION_TIMEOUT_SECONDS: u64 = 3600;

/// Session Manager - manages multiple debug sessions (spec §4.6/C8).
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<DebugSession>>>>,
    max_sessions: usize,
    session_timeout: Duration,
    data_dir: Option<PathBuf>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TIMEOUT_SECONDS)
    }

    pub fn with_limits(max_sessions: usize, session_timeout_seconds: u64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions,
            session_timeout: Duration::from_secs(session_timeout_seconds),
            data_dir: None,
        }
    }

    /// Enable write-through persistence (spec §4.8) for every session this
    /// manager creates from here on.
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    /// Turn on persistence for a freshly-created session, if this manager
    /// was configured with a data directory. `project_root` falls back to
    /// the program's parent directory when no explicit cwd was given.
    async fn enable_persistence_for(
        &self,
        session: &Arc<DebugSession>,
        program: &str,
        cwd: Option<&str>,
        launch_args: serde_json::Value,
    ) {
        let Some(data_dir) = self.data_dir.clone() else { return };
        let project_root = cwd.map(str::to_string).unwrap_or_else(|| {
            std::path::Path::new(program)
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| ".".to_string())
        });
        session.enable_persistence(data_dir, project_root, Some(launch_args)).await;
    }

    /// Spawn the idle sweeper (spec §4.6): a `tokio::time::interval` loop
    /// that terminates RUNNING/STOPPED sessions that haven't seen a public
    /// operation within `session_timeout`, mirroring the background
    /// reader-task idiom `dap/client.rs` uses for its own long-lived loop.
    pub fn spawn_idle_sweeper(manager: Arc<RwLock<SessionManager>>, sweep_interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                let (timeout, stale_ids) = {
                    let manager = manager.read().await;
                    let sessions = manager.sessions.read().await;
                    let mut stale = Vec::new();
                    for (id, session) in sessions.iter() {
                        let state = session.get_state().await;
                        if matches!(state, DebugState::Running | DebugState::Stopped)
                            && session.idle_for().await > manager.session_timeout
                        {
                            stale.push(id.clone());
                        }
                    }
                    (manager.session_timeout, stale)
                };

                for id in stale_ids {
                    warn!("sweeping idle session {id} (timeout {timeout:?})");
                    let manager = manager.read().await;
                    if let Err(e) = manager.remove_session(&id).await {
                        warn!("failed to sweep idle session {id}: {e}");
                    }
                }
            }
        })
    }

    pub async fn create_session(
        &self,
        language: &str,
        program: String,
        args: Vec<String>,
        cwd: Option<String>,
        stop_on_entry: bool,
    ) -> Result<String> {
        {
            let sessions = self.sessions.read().await;
            if sessions.len() >= self.max_sessions {
                return Err(Error::CapacityExceeded(self.max_sessions));
            }
        }

        crate::adapters::security::validate_source_path(&program, None)?;
        if let Some(cwd_path) = cwd.as_deref() {
            crate::adapters::security::validate_directory_path(cwd_path)?;
        }

        // Normalize spec's language tag set ({py, js, go, rust, native}, spec.md §3)
        // onto the adapter-module names used internally below.
        let language = Self::normalize_language(language);

        // Type alias for STDIO adapter tuple: (command, args, adapter_id, launch_args, adapter_for_logging)
        type StdioAdapterTuple<'a> = (String, Vec<String>, &'a str, serde_json::Value, Box<dyn DebugAdapterLogger + 'a>);

        let (command, adapter_args, adapter_id, launch_args, adapter): StdioAdapterTuple = match language {
            "python" => {
                // Create adapter instance for logging
                let adapter = PythonAdapter;

                // Log adapter selection
                adapter.log_selection();

                let cmd = PythonAdapter::command();
                let adapter_args = PythonAdapter::args();
                let adapter_id = PythonAdapter::adapter_id();
                let launch_args = PythonAdapter::launch_args_with_options(
                    &program,
                    &args,
                    cwd.as_deref(),
                    stop_on_entry,
                );

                // Log transport initialization
                adapter.log_transport_init();

                (cmd, adapter_args, adapter_id, launch_args, Box::new(adapter))
            }
            "ruby" => {
                // Create adapter instance for logging
                let adapter = RubyAdapter;

                // Log adapter selection
                adapter.log_selection();

                // Log transport initialization
                adapter.log_transport_init();

                // Ruby uses socket-based communication, not stdio
                // Spawn rdbg and connect to socket
                adapter.log_spawn_attempt();
                let ruby_session = RubyAdapter::spawn(&program, &args, stop_on_entry)
                    .await
                    .map_err(|e| {
                        adapter.log_spawn_error(&e);
                        e
                    })?;

                // Log successful connection with Ruby-specific details
                ruby_session.log_connection_success_with_port();

                let adapter_id = RubyAdapter::adapter_id();
                let launch_args = RubyAdapter::launch_args_with_options(
                    &program,
                    &args,
                    cwd.as_deref(),
                    stop_on_entry,
                );

                // Create DAP client from socket
                let client = DapClient::from_socket(ruby_session.socket)
                    .await
                    .map_err(|e| {
                        adapter.log_connection_error(&e);
                        e
                    })?;

                // Create session
                let session = DebugSession::new(language.to_string(), program.clone(), client).await?;
                let session_id = session.id.clone();

                // Store session immediately
                let session_arc = Arc::new(session);
                {
                    let mut sessions = self.sessions.write().await;
                    sessions.insert(session_id.clone(), session_arc.clone());
                }

                // Log workaround application (Ruby requires entry breakpoint workaround)
                adapter.log_workaround_applied();

                self.enable_persistence_for(&session_arc, &program, cwd.as_deref(), launch_args.clone())
                    .await;

                // Initialize and launch in the background
                tokio::spawn(session_arc.initialize_and_launch_async(
                    adapter_id.to_string(),
                    launch_args,
                ));

                return Ok(session_id);
            }
            "go" => {
                // Create adapter instance for logging
                let adapter = GoAdapter;

                // Log adapter selection
                adapter.log_selection();

                // Log transport initialization
                adapter.log_transport_init();

                // Delve speaks DAP natively over a TCP socket, not stdio
                adapter.log_spawn_attempt();
                let go_session = GoAdapter::spawn(&program, &args, stop_on_entry)
                    .await
                    .map_err(|e| {
                        adapter.log_spawn_error(&e);
                        e
                    })?;

                go_session.log_connection_success_with_port();

                let adapter_id = GoAdapter::adapter_id();
                let launch_args = GoAdapter::launch_args_with_options(
                    &program,
                    &args,
                    cwd.as_deref(),
                    stop_on_entry,
                );

                // Create DAP client from socket
                let client = DapClient::from_socket(go_session.socket)
                    .await
                    .map_err(|e| {
                        adapter.log_connection_error(&e);
                        e
                    })?;

                // Create session
                let session = DebugSession::new(language.to_string(), program.clone(), client).await?;
                let session_id = session.id.clone();

                // Store session immediately
                let session_arc = Arc::new(session);
                {
                    let mut sessions = self.sessions.write().await;
                    sessions.insert(session_id.clone(), session_arc.clone());
                }

                self.enable_persistence_for(&session_arc, &program, cwd.as_deref(), launch_args.clone())
                    .await;

                // Initialize and launch in the background
                tokio::spawn(session_arc.initialize_and_launch_async(
                    adapter_id.to_string(),
                    launch_args,
                ));

                return Ok(session_id);
            }
            "nodejs" => {
                // Create adapter instance for logging
                let adapter = NodeJsAdapter;

                // Log adapter selection
                adapter.log_selection();

                // Log transport initialization
                adapter.log_transport_init();

                // Node.js uses socket-based communication with vscode-js-debug DAP server
                // Spawn vscode-js-debug and connect to socket
                adapter.log_spawn_attempt();
                let nodejs_session = NodeJsAdapter::spawn_dap_server()
                    .await
                    .map_err(|e| {
                        adapter.log_spawn_error(&e);
                        e
                    })?;

                // Log successful connection with Node.js-specific details
                nodejs_session.log_connection_success_with_details();

                let adapter_id = NodeJsAdapter::adapter_id();
                let launch_args = NodeJsAdapter::launch_config(
                    &program,
                    &args,
                    cwd.as_deref(),
                    stop_on_entry,
                );

                // Create DAP client from socket (parent session)
                let parent_client = DapClient::from_socket(nodejs_session.socket)
                    .await
                    .map_err(|e| {
                        adapter.log_connection_error(&e);
                        e
                    })?;

                info!("🔄 [NODEJS] Creating multi-session manager for parent session");

                // Create session with multi-session mode
                use super::session::SessionMode;
                use super::multi_session::MultiSessionManager;

                let session_id = uuid::Uuid::new_v4().to_string();
                let multi_session_manager = MultiSessionManager::new(session_id.clone());

                let session_mode = SessionMode::MultiSession {
                    parent_client: Arc::new(RwLock::new(parent_client)),
                    multi_session_manager: multi_session_manager.clone(),
                    vscode_js_debug_port: nodejs_session.port,
                };

                let session = DebugSession::new_with_mode(
                    language.to_string(),
                    program.clone(),
                    session_mode,
                )
                .await?;

                // Store session immediately
                let session_arc = Arc::new(session);
                {
                    let mut sessions = self.sessions.write().await;
                    sessions.insert(session_id.clone(), session_arc.clone());
                }

                // Register child session spawn callback on parent client
                info!("🔄 [NODEJS] Registering child session spawn callback");
                let session_clone = session_arc.clone();
                if let SessionMode::MultiSession { parent_client, .. } = &session_arc.session_mode {
                    let parent = parent_client.read().await;
                    parent
                        .on_child_session_spawn(move |target_id| {
                            let session = session_clone.clone();
                            Box::pin(async move {
                                info!("🎯 [NODEJS] Child session spawn callback invoked for target_id: {}", target_id);
                                if let Err(e) = session.spawn_child_session(target_id).await {
                                    error!("❌ [NODEJS] Failed to spawn child session: {}", e);
                                } else {
                                    info!("✅ [NODEJS] Child session spawned successfully");
                                }
                            })
                        })
                        .await;
                }

                // Log workaround application (Node.js uses multi-session for stopOnEntry)
                adapter.log_workaround_applied();

                self.enable_persistence_for(&session_arc, &program, cwd.as_deref(), launch_args.clone())
                    .await;

                // Initialize and launch in the background
                // This will trigger the parent session, which will send startDebugging reverse request
                tokio::spawn(session_arc.initialize_and_launch_async(
                    adapter_id.to_string(),
                    launch_args,
                ));

                return Ok(session_id);
            }
            "rust" => {
                // Create adapter instance for logging
                let adapter = RustAdapter;

                // Log adapter selection
                adapter.log_selection();

                info!("🔨 [RUST] Compiling Rust source before debugging");

                // Step 1: Compile the Rust source (auto-detects single-file vs Cargo project)
                RustAdapter::log_compilation_start(&program, false);  // false = debug build
                let binary_path = RustAdapter::compile(&program, false)
                    .await
                    .map_err(|e| {
                        RustAdapter::log_compilation_error(&e);
                        e
                    })?;

                RustAdapter::log_compilation_success(&binary_path);

                // Step 2: Prepare CodeLLDB adapter
                let cmd = RustAdapter::command();
                let adapter_args = RustAdapter::args();
                let adapter_id = RustAdapter::adapter_id();
                let launch_args = RustAdapter::launch_args(
                    &binary_path,  // Use compiled binary path, not source
                    &args,
                    cwd.as_deref(),
                    stop_on_entry,
                );

                // Log transport initialization
                adapter.log_transport_init();

                (cmd, adapter_args, adapter_id, launch_args, Box::new(adapter))
            }
            _ => return Err(Error::AdapterNotFound(language.to_string())),
        };

        // Spawn DAP client (Python/Rust path - uses STDIO transport)
        // Adapter instance is passed from match arm above for language-specific logging
        adapter.log_spawn_attempt();
        let client = DapClient::spawn(&command, &adapter_args)
            .await
            .map_err(|e| {
                adapter.log_spawn_error(&e);
                e
            })?;

        // Log successful connection
        adapter.log_connection_success();

        // Create session
        let session = DebugSession::new(language.to_string(), program.clone(), client).await?;
        let session_id = session.id.clone();

        // Store session immediately
        let session_arc = Arc::new(session);
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), session_arc.clone());
        }

        // Log workaround if needed (Python/Rust don't require workarounds)
        adapter.log_workaround_applied();

        self.enable_persistence_for(&session_arc, &program, cwd.as_deref(), launch_args.clone())
            .await;

        // Initialize and launch in the background
        tokio::spawn(session_arc.initialize_and_launch_async(
            adapter_id.to_string(),
            launch_args,
        ));

        Ok(session_id)
    }

    /// List processes running inside a container/pod (spec §4.10/C11,
    /// scenario S6 `container_list_processes`).
    pub async fn list_container_processes(
        &self,
        runtime: &str,
        container: &str,
        language: &str,
    ) -> Result<Vec<crate::process::ContainerProcess>> {
        let runtime = crate::process::Runtime::parse(runtime)?;
        crate::process::list_processes(runtime, container, language).await
    }

    /// Inject a debug stub against a running in-container process and
    /// attach a session to it (spec §4.10/C11, scenario S6
    /// `container_attach`). The new session reaches the adapter over the
    /// port-forwarded loopback socket C11 establishes, exactly like the
    /// Ruby/Go socket-based adapters.
    pub async fn create_container_attach_session(
        &self,
        runtime: &str,
        container: &str,
        pid: u32,
        language: &str,
    ) -> Result<String> {
        {
            let sessions = self.sessions.read().await;
            if sessions.len() >= self.max_sessions {
                return Err(Error::CapacityExceeded(self.max_sessions));
            }
        }

        let runtime = crate::process::Runtime::parse(runtime)?;
        let endpoint = crate::process::attach_in_container(runtime, container, pid, language).await?;
        let socket = crate::process::connect_attach(&endpoint).await?;
        let client = DapClient::from_socket(socket).await?;

        let adapter_id = match language {
            "py" => "debugpy",
            other => other,
        };

        // process:: takes spec's short language tags ("py"), but DebugSession
        // stores the same normalized name create_session uses so that
        // initialize_and_attach's adapter_type dispatch still matches.
        let stored_language = Self::normalize_language(language);

        let session = DebugSession::new(stored_language.to_string(), format!("container:{container}:{pid}"), client).await?;
        let session_id = session.id.clone();

        let session_arc = Arc::new(session);
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), session_arc.clone());
        }

        let attach_args = serde_json::json!({ "pid": pid });
        tokio::spawn(session_arc.initialize_and_attach_async(adapter_id.to_string(), attach_args));

        Ok(session_id)
    }

    /// Launch `program` directly inside a container with no attach stub
    /// (spec §4.10/C11). Only meaningful for a program that itself speaks
    /// DAP over stdio, mirroring how `DapClient::spawn` drives a local
    /// adapter binary.
    pub async fn create_container_launch_session(
        &self,
        runtime: &str,
        container: &str,
        program: String,
        args: Vec<String>,
        language: &str,
    ) -> Result<String> {
        {
            let sessions = self.sessions.read().await;
            if sessions.len() >= self.max_sessions {
                return Err(Error::CapacityExceeded(self.max_sessions));
            }
        }

        let runtime = crate::process::Runtime::parse(runtime)?;
        let child = crate::process::launch_in_container(runtime, container, &program, &args).await?;
        let client = DapClient::from_child(child).await?;

        let stored_language = Self::normalize_language(language);
        let session = DebugSession::new(stored_language.to_string(), program.clone(), client).await?;
        let session_id = session.id.clone();

        let session_arc = Arc::new(session);
        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id.clone(), session_arc.clone());
        }

        let launch_args = serde_json::json!({ "program": program, "args": args });
        tokio::spawn(session_arc.initialize_and_launch_async(stored_language.to_string(), launch_args));

        Ok(session_id)
    }

    /// Normalize spec's language tag set onto the adapter-module names
    /// `DebugSession`/`initialize_and_attach` dispatch on — the same mapping
    /// `create_session` applies inline before its per-language match.
    fn normalize_language(language: &str) -> &str {
        match language {
            "py" => "python",
            "js" | "ts" => "nodejs",
            "native" | "c" | "cpp" | "c++" => "rust",
            other => other,
        }
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Arc<DebugSession>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }

    pub async fn get_session_state(&self, session_id: &str) -> Result<crate::debug::state::DebugState> {
        let session = self.get_session(session_id).await?;
        Ok(session.get_state().await)
    }

    pub async fn list_sessions(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }

    pub async fn remove_session(&self, session_id: &str) -> Result<()> {
        // Disconnect the session first
        if let Ok(session) = self.get_session(session_id).await {
            let _ = session.disconnect().await;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .remove(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        Ok(())
    }
}
