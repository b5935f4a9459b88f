//! Listener and accept loop
//!
//! Binds the SOCKS5 listener and spawns one session task per accepted
//! connection until a shutdown signal arrives.

use crate::config::{ServerConfig, SocksConfig};
use crate::socks::{handle_socks5_on_stream, TcpDialer};
use crate::transport::SocketOpts;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Pause after a failed accept, e.g. when out of file descriptors
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Bound SOCKS5 server
pub struct Server {
    listener: TcpListener,
    socks: Arc<SocksConfig>,
    dialer: Arc<TcpDialer>,
}

impl Server {
    /// Bind the listener described by the configuration
    ///
    /// A bind failure is the only fatal error of the server.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Listen failed on {}", addr))?;

        Ok(Self::from_listener(listener, config.socks.clone()))
    }

    /// Wrap an already bound listener
    pub fn from_listener(listener: TcpListener, socks: SocksConfig) -> Self {
        let dialer = Arc::new(TcpDialer::new(&socks));
        Server {
            listener,
            socks: Arc::new(socks),
            dialer,
        }
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until shutdown
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        let socket_opts = SocketOpts::from_tcp_config(&self.socks.tcp);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            socket_opts.hint(&stream);
                            if self.socks.log_connections {
                                info!("Client: {}", peer);
                            }
                            tokio::spawn(serve_connection(
                                stream,
                                peer,
                                self.socks.clone(),
                                self.dialer.clone(),
                            ));
                        }
                        Err(e) => {
                            error!("Accept failed: {}", e);
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Run one session and report how it ended
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    socks: Arc<SocksConfig>,
    dialer: Arc<TcpDialer>,
) {
    match handle_socks5_on_stream(stream, &socks, dialer.as_ref()).await {
        Ok(stats) => debug!(
            "Session {} closed: {} bytes up, {} bytes down",
            peer, stats.client_to_target, stats.target_to_client
        ),
        Err(e) => warn!("Session {} failed: {}", peer, e),
    }
}

/// Bind and run the server until shutdown
pub async fn run_server(config: ServerConfig, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let server = Server::bind(&config).await?;
    info!("SOCKS5 server listening on {}", server.local_addr()?);
    server.run(shutdown_rx).await
}
