//! Container runtime bridge (C11, spec §4.10).
//!
//! Enumerates processes inside a running container, injects a language
//! debug stub against a target pid (or launches one directly), and hands
//! the result back as a TCP endpoint C2 can dial exactly like any other
//! socket-based adapter. Shells out to the runtime CLI (`docker`/`podman`/
//! `kubectl`) the way the Go/Ruby adapters shell out to `dlv`/`rdbg` —
//! spawn via `tokio::process::Command`, classify failures by exit code
//! and stderr rather than parsing stdout structurally.

use crate::dap::socket_helper;
use crate::{Error, Result};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::{info, warn};

/// Supported container runtimes. `kubectl` targets a pod rather than a
/// container name but is addressed identically from here on (the
/// `container` argument becomes a pod name).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Docker,
    Podman,
    Kubernetes,
}

impl Runtime {
    fn binary(&self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Podman => "podman",
            Self::Kubernetes => "kubectl",
        }
    }

    fn exec_subcommand(&self) -> &'static str {
        match self {
            Self::Docker | Self::Podman => "exec",
            Self::Kubernetes => "exec",
        }
    }

    /// Parse the runtime names the front-ends accept (spec §4.10).
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "docker" => Ok(Self::Docker),
            "podman" => Ok(Self::Podman),
            "kubernetes" | "k8s" | "kubectl" => Ok(Self::Kubernetes),
            other => Err(Error::InvalidArgument(format!("unknown container runtime {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerProcess {
    pub pid: u32,
    pub command: String,
    pub is_target_language_candidate: bool,
}

fn candidate_for(command: &str, language: &str) -> bool {
    let marker = match language {
        "py" => "python",
        "js" => "node",
        "go" => "",
        "native" => "",
        _ => "",
    };
    !marker.is_empty() && command.contains(marker)
}

async fn run(runtime: Runtime, args: &[&str]) -> Result<std::process::Output> {
    let binary = runtime.binary();
    let output = Command::new(binary)
        .args(args)
        .output()
        .await
        .map_err(|e| Error::RuntimeUnavailable(format!("{binary} unavailable: {e}")))?;
    Ok(output)
}

/// List processes running inside `container`, tagging each as a plausible
/// attach target for `language` (best-effort substring match on the
/// command line — the same heuristic a human would use eyeballing `ps`).
pub async fn list_processes(
    runtime: Runtime,
    container: &str,
    language: &str,
) -> Result<Vec<ContainerProcess>> {
    let output = run(
        runtime,
        &[runtime.exec_subcommand(), container, "ps", "-eo", "pid,command"],
    )
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No such container") || stderr.contains("not found") {
            return Err(Error::ContainerNotFound(container.to_string()));
        }
        return Err(Error::RuntimeUnavailable(stderr.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut processes = Vec::new();
    for line in stdout.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((pid_str, command)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let Ok(pid) = pid_str.trim().parse::<u32>() else {
            continue;
        };
        let command = command.trim().to_string();
        let is_target_language_candidate = candidate_for(&command, language);
        processes.push(ContainerProcess {
            pid,
            command,
            is_target_language_candidate,
        });
    }
    Ok(processes)
}

/// Result of a successful in-container attach: a loopback TCP endpoint
/// C2 can dial, plus a teardown handle the owning session holds until
/// `terminate`.
pub struct AttachEndpoint {
    pub host: &'static str,
    pub port: u16,
    forward: tokio::process::Child,
}

impl AttachEndpoint {
    pub async fn teardown(mut self) -> Result<()> {
        let _ = self.forward.kill().await;
        Ok(())
    }
}

fn stub_command(language: &str, pid: u32, remote_port: u16) -> Result<Vec<String>> {
    match language {
        "py" => Ok(vec![
            "python".into(),
            "-m".into(),
            "debugpy".into(),
            "--listen".into(),
            format!(":{remote_port}"),
            "--pid".into(),
            pid.to_string(),
        ]),
        other => Err(Error::InjectionFailed(format!(
            "no debug stub known for language {other:?}"
        ))),
    }
}

/// Inject a debug stub against `pid` inside `container` and establish a
/// port forward. Returns the local endpoint; failures surface as
/// `InjectionFailed`/`PortAllocationFailed` per spec §4.10.
pub async fn attach_in_container(
    runtime: Runtime,
    container: &str,
    pid: u32,
    language: &str,
) -> Result<AttachEndpoint> {
    let remote_port = socket_helper::find_free_port()?;
    let cmd = stub_command(language, pid, remote_port)?;

    let mut inject_args: Vec<&str> = vec![runtime.exec_subcommand(), "-d", container];
    let cmd_refs: Vec<&str> = cmd.iter().map(String::as_str).collect();
    inject_args.extend(cmd_refs.iter());

    let output = run(runtime, &inject_args).await?;
    if !output.status.success() {
        return Err(Error::InjectionFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let local_port = socket_helper::find_free_port()?;
    let forward_args = match runtime {
        Runtime::Docker | Runtime::Podman => vec![
            "port".to_string(),
            container.to_string(),
            remote_port.to_string(),
        ],
        Runtime::Kubernetes => vec![
            "port-forward".to_string(),
            container.to_string(),
            format!("{local_port}:{remote_port}"),
        ],
    };
    let forward_refs: Vec<&str> = forward_args.iter().map(String::as_str).collect();
    let forward = tokio::process::Command::new(runtime.binary())
        .args(&forward_refs)
        .spawn()
        .map_err(|e| Error::PortAllocationFailed(format!("failed to start port forward: {e}")))?;

    info!(
        "container attach: {} pid {} -> 127.0.0.1:{} (stub on :{})",
        container, pid, local_port, remote_port
    );

    Ok(AttachEndpoint {
        host: "127.0.0.1",
        port: local_port,
        forward,
    })
}

/// Connect to an already-established attach endpoint. Separated from
/// `attach_in_container` so the socket dial can be retried independently
/// of the (slower, one-shot) injection step.
pub async fn connect_attach(endpoint: &AttachEndpoint) -> Result<TcpStream> {
    socket_helper::connect_with_retry(endpoint.port, Duration::from_secs(5)).await
}

/// Launch `program` directly inside `container` (no attach, no stub) with
/// stdio inherited through the runtime CLI (spec §4.10). Returns the
/// spawned child's stdio pipes the same way `DapClient::spawn` does for a
/// local process.
pub async fn launch_in_container(
    runtime: Runtime,
    container: &str,
    program: &str,
    args: &[String],
) -> Result<tokio::process::Child> {
    let mut full_args: Vec<&str> = vec![runtime.exec_subcommand(), "-i", container, program];
    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    full_args.extend(arg_refs.iter());

    let child = Command::new(runtime.binary())
        .args(&full_args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| Error::RuntimeUnavailable(format!("failed to launch in container: {e}")))?;

    Ok(child)
}

/// Drain a child's stderr into the tracing log; used when a container
/// exec fails after spawn but before the DAP handshake completes.
pub async fn drain_stderr_to_log(child: &mut tokio::process::Child) {
    if let Some(mut stderr) = child.stderr.take() {
        let mut buf = String::new();
        if stderr.read_to_string(&mut buf).await.is_ok() && !buf.trim().is_empty() {
            warn!("container process stderr: {}", buf.trim());
        }
    }
}
