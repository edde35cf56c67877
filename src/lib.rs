pub mod adapters;
pub mod config;
pub mod dap;
pub mod debug;
pub mod error;
pub mod http;
pub mod mcp;
pub mod process;

pub use config::Config;
pub use error::Error;
pub use mcp::McpServer;

use debug::manager::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub type Result<T> = std::result::Result<T, Error>;

/// Start the broker: the stdio tool-call front-end, the HTTP front-end
/// (if `config.port` resolves to a bound listener), and the idle sweeper,
/// all sharing one `SessionManager` (spec §4.6/§6).
pub async fn serve() -> Result<()> {
    let config = Config::from_env();

    if let Ok(recoverable) = debug::persistence::list_recoverable(&config.data_dir_path()) {
        for session in &recoverable {
            info!("found recoverable session {} ({}), not auto-resumed", session.id, session.language);
        }
    }

    let session_manager = Arc::new(RwLock::new(
        SessionManager::with_limits(config.max_sessions, config.session_timeout_seconds)
            .with_data_dir(config.data_dir_path()),
    ));

    SessionManager::spawn_idle_sweeper(Arc::clone(&session_manager), Duration::from_secs(60));

    let http_listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await;
    match http_listener {
        Ok(listener) => {
            let addr = listener.local_addr().ok();
            let app = http::router(Arc::clone(&session_manager));
            tokio::spawn(async move {
                if let Some(addr) = addr {
                    info!("HTTP surface listening on {addr}");
                }
                if let Err(e) = axum::serve(listener, app).await {
                    warn!("HTTP surface exited: {e}");
                }
            });
        }
        Err(e) => warn!("HTTP surface disabled, failed to bind {}:{}: {e}", config.host, config.port),
    }

    let server = McpServer::new_with_manager(session_manager).await?;
    server.run().await
}
