// file: src/system/net.rs
// version: 1.0.0
// guid: 9c5b1e78-2a4d-4f30-86e9-d7f20b3a514c

//! TCP reachability checks

use anyhow::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Seconds between reachability attempts
pub const PROBE_INTERVAL_SECS: u64 = 2;
/// Per-attempt connect timeout
const CONNECT_TIMEOUT_SECS: u64 = 2;

/// Test whether a TCP connection to host:port can be established
pub async fn test_connectivity(host: &str, port: u16) -> Result<bool> {
    debug!("Testing connectivity to {}:{}", host, port);

    let connect = tokio::net::TcpStream::connect((host, port));
    match timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS), connect).await {
        Ok(Ok(_)) => Ok(true),
        Ok(Err(e)) => {
            debug!("Failed to connect to {}:{}: {}", host, port, e);
            Ok(false)
        }
        Err(_) => {
            debug!("Connection to {}:{} timed out", host, port);
            Ok(false)
        }
    }
}

/// Wait for host:port to become reachable, probing every
/// [`PROBE_INTERVAL_SECS`] until the overall timeout elapses.
pub async fn wait_for_port(host: &str, port: u16, timeout_secs: u64) -> Result<()> {
    let attempts = (timeout_secs / PROBE_INTERVAL_SECS).max(1);
    for attempt in 1..=attempts {
        if test_connectivity(host, port).await? {
            debug!("{}:{} reachable after {} probe(s)", host, port, attempt);
            return Ok(());
        }
        if attempt < attempts {
            tokio::time::sleep(Duration::from_secs(PROBE_INTERVAL_SECS)).await;
        }
    }
    anyhow::bail!(
        "{}:{} not reachable within {} seconds",
        host,
        port,
        timeout_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connectivity_to_listening_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(test_connectivity("127.0.0.1", port).await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_for_port_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        wait_for_port("127.0.0.1", port, 4).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_port_timeout() {
        // Bind then drop so the port is very likely closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = wait_for_port("127.0.0.1", port, 2).await.unwrap_err();
        assert!(err.to_string().contains("not reachable"));
    }
}
