/// Helper functions for socket-based DAP adapters (e.g., Ruby/rdbg)
use crate::{Error, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Find an available TCP port on localhost
pub fn find_free_port() -> Result<u16> {
    // Use port 0 to let OS assign a free port
    let listener = std::net::TcpListener::bind("127.0.0.1:0")
        .map_err(|e| Error::Process(format!("Failed to bind to port: {}", e)))?;

    let port = listener.local_addr()
        .map_err(|e| Error::Process(format!("Failed to get local address: {}", e)))?
        .port();

    debug!("Found free port: {}", port);
    Ok(port)
}

/// Connect to TCP socket with retry and timeout
///
/// Retries connecting to the specified port for up to `timeout` duration,
/// with 100ms between attempts.
pub async fn connect_with_retry(port: u16, timeout: Duration) -> Result<TcpStream> {
    let start = std::time::Instant::now();
    let retry_interval = Duration::from_millis(100);

    info!("Connecting to 127.0.0.1:{} (timeout: {:?})", port, timeout);

    loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => {
                info!("Connected to 127.0.0.1:{} after {:?}", port, start.elapsed());
                return Ok(stream);
            }
            Err(e) => {
                if start.elapsed() >= timeout {
                    return Err(Error::Process(format!(
                        "Failed to connect to port {} after {:?}: {}",
                        port, timeout, e
                    )));
                }
                // Wait before retrying
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}
