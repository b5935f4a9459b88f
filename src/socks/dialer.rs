//! Destination dialing
//!
//! Opens the outbound connection for a CONNECT request and answers the
//! client with the CONNECT reply.

use crate::config::SocksConfig;
use crate::error::SocksError;
use crate::socks::command::{send_failure, send_success};
use crate::socks::types::TargetAddr;
use crate::transport::{SocketOpts, SocksStream};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// Opens connections to CONNECT targets
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// The stream type produced by this dialer
    type Stream: SocksStream;

    /// Connect to the target endpoint
    async fn dial(&self, target: &TargetAddr) -> Result<Self::Stream, SocksError>;
}

/// Plain TCP dialer
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout
    connect_timeout: Duration,
}

impl TcpDialer {
    /// Create a dialer from SOCKS configuration
    pub fn new(config: &SocksConfig) -> Self {
        TcpDialer {
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: config.connect_deadline(),
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, target: &TargetAddr) -> Result<Self::Stream, SocksError> {
        let endpoint = target.to_string();

        let stream = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect(endpoint.as_str()),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(SocksError::Dial {
                    target: endpoint,
                    source,
                })
            }
            Err(_) => {
                return Err(SocksError::Dial {
                    target: endpoint,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                })
            }
        };

        self.socket_opts.hint(&stream);

        debug!("TCP connection established to {}", endpoint);

        Ok(stream)
    }
}

/// Dial the target and send the CONNECT reply
///
/// On dial failure the client receives a failure reply when
/// `reply_on_error` is set and nothing otherwise. If the success reply
/// cannot be written, the fresh destination connection is shut down before
/// the error is returned.
pub async fn connect_target<S, D>(
    client: &mut S,
    dialer: &D,
    target: &TargetAddr,
    reply_on_error: bool,
) -> Result<D::Stream, SocksError>
where
    S: SocksStream,
    D: Dialer,
{
    let mut destination = match dialer.dial(target).await {
        Ok(stream) => stream,
        Err(e) => {
            if reply_on_error {
                let _ = send_failure(client, &e).await;
            }
            return Err(e);
        }
    };

    if let Err(e) = send_success(client).await {
        let _ = destination.shutdown().await;
        drop(destination);
        return Err(e.into());
    }

    Ok(destination)
}
