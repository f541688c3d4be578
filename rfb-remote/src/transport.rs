//! TCP transport for VNC connections.
//!
//! Opening applies the configured connect timeout and enables TCP_NODELAY.
//! Closing shuts down the input side, then the output side, then releases
//! the socket; each step runs even if an earlier one failed.
//!
//! # Examples
//!
//! ```no_run
//! use rfb_remote::address::TargetAddress;
//! use rfb_remote::transport;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), rfb_remote::RfbClientError> {
//! let target = TargetAddress::parse("127.0.0.1", "5900")?;
//! let stream = transport::connect_tcp(target, Duration::from_secs(5)).await?;
//! transport::close_ordered(stream)?;
//! # Ok(())
//! # }
//! ```

use crate::address::TargetAddress;
use crate::errors::RfbClientError;
use socket2::SockRef;
use std::net::Shutdown;
use std::time::Duration;
use tokio::net::TcpStream;

/// Connect to `target`, failing with [`RfbClientError::Timeout`] after `timeout`.
pub async fn connect_tcp(
    target: TargetAddress,
    timeout: Duration,
) -> Result<TcpStream, RfbClientError> {
    let addr = target.socket_addr();
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| RfbClientError::Timeout(timeout))?
        .map_err(|e| {
            RfbClientError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
        })?;

    // Enable TCP_NODELAY for low-latency pointer events
    stream.set_nodelay(true).map_err(|e| {
        RfbClientError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
    })?;

    // Log local and remote addresses for correlation with server logs
    if let (Ok(local), Ok(peer)) = (stream.local_addr(), stream.peer_addr()) {
        tracing::info!("Connected via TCP: local={} -> remote={}", local, peer);
    } else {
        tracing::info!("Connected to {} via TCP", addr);
    }
    Ok(stream)
}

/// Shut down reads, then writes, then drop the socket.
///
/// # Errors
///
/// [`RfbClientError::CloseFailed`] listing every step that failed. The socket
/// is released either way.
pub fn close_ordered(stream: TcpStream) -> Result<(), RfbClientError> {
    let mut failures = Vec::new();
    {
        let sock = SockRef::from(&stream);
        for (step, how) in [("input", Shutdown::Read), ("output", Shutdown::Write)] {
            if let Err(e) = sock.shutdown(how) {
                tracing::debug!("shutdown of {} side failed: {}", step, e);
                failures.push(format!("{}: {}", step, e));
            }
        }
    }
    drop(stream);

    if failures.is_empty() {
        tracing::info!("Connection closed");
        Ok(())
    } else {
        Err(RfbClientError::CloseFailed(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_and_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1];
            // EOF once the client shuts down its output side
            socket.read(&mut buf).await.unwrap()
        });

        let target = TargetAddress::parse("127.0.0.1", &port.to_string()).unwrap();
        let stream = connect_tcp(target, Duration::from_secs(5)).await.unwrap();
        assert!(stream.nodelay().unwrap());

        close_ordered(stream).unwrap();
        assert_eq!(server.await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to find a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = TargetAddress::parse("127.0.0.1", &port.to_string()).unwrap();
        let err = connect_tcp(target, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, RfbClientError::ConnectionFailed(_)));
        assert!(err.is_retryable());
    }
}
