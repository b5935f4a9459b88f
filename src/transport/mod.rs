//! Transport module for Socksrelay
//!
//! Socket tuning for TCP connections and the stream capability the SOCKS5
//! engine is written against.

use crate::config::TcpConfig;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Byte stream a session can run on
///
/// Sessions and the relay only need to read, write and shut down. TCP
/// sockets, duplex pipes and test mocks all qualify.
pub trait SocksStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> SocksStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Socket options for configuring connections
#[derive(Debug, Clone)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts {
            nodelay: true,
            keepalive_secs: Some(20),
            keepalive_interval: Some(8),
        }
    }
}

impl SocketOpts {
    /// Create socket options from TCP config
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs).filter(|s| *s > 0),
            keepalive_interval: Some(config.keepalive_interval).filter(|s| *s > 0),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }

    /// Apply options, logging instead of failing
    pub fn hint(&self, stream: &TcpStream) {
        if let Err(e) = self.apply(stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }
    }
}
