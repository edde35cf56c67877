use clap::Parser;
use std::path::PathBuf;

fn default_data_dir() -> String {
    shellexpand::tilde("~/.polybugger-mcp").into_owned()
}

/// Broker-wide configuration. Every field has an env-var fallback under the
/// `PYBUGGER_MCP_` prefix (spec §6); CLI flags, when present, take
/// precedence over the environment (clap's `env` derive attribute resolves
/// in that order automatically).
#[derive(Parser, Debug, Clone)]
#[command(name = "polybugger-mcp-config")]
pub struct Config {
    #[arg(long, env = "PYBUGGER_MCP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PYBUGGER_MCP_PORT", default_value_t = 0)]
    pub port: u16,

    #[arg(long, env = "PYBUGGER_MCP_MAX_SESSIONS", default_value_t = 10)]
    pub max_sessions: usize,

    #[arg(long, env = "PYBUGGER_MCP_SESSION_TIMEOUT_SECONDS", default_value_t = 3600)]
    pub session_timeout_seconds: u64,

    #[arg(long, env = "PYBUGGER_MCP_DATA_DIR", default_value_t = default_data_dir())]
    pub data_dir: String,

    #[arg(long, env = "PYBUGGER_MCP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Parse from environment only, ignoring `argv` — used when the broker
    /// is embedded (e.g. under `serve`) rather than invoked as a standalone
    /// CLI. `Parser::parse_from` with just the binary name makes every
    /// field fall back to its env/default resolution.
    pub fn from_env() -> Self {
        Self::parse_from(["polybugger-mcp"])
    }

    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).into_owned())
    }
}
