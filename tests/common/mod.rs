//! Test utilities and mocks for Socksrelay
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use socksrelay::config::SocksConfig;
use socksrelay::Server;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Start a loop-back echo server
pub async fn start_echo_server() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let (mut reader, mut writer) = stream.split();
                let _ = tokio::io::copy(&mut reader, &mut writer).await;
            });
        }
    });

    addr
}

/// Port that refuses connections
pub async fn closed_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Running relay bound to a loop-back port
pub struct TestRelay {
    /// Listen address of the relay
    pub addr: SocketAddr,
    shutdown_tx: broadcast::Sender<bool>,
}

impl TestRelay {
    /// Bind and spawn a relay with the given SOCKS5 settings
    pub async fn start(socks: SocksConfig) -> Self {
        let (listener, addr) = create_test_listener().await;
        let server = Server::from_listener(listener, socks);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        tokio::spawn(server.run(shutdown_rx));

        TestRelay { addr, shutdown_tx }
    }

    /// Open a client connection to the relay
    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr).await.unwrap()
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Config requiring the given credentials
pub fn auth_config(username: &str, password: &str) -> SocksConfig {
    SocksConfig {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        ..Default::default()
    }
}

/// Send a greeting and return the selected method
pub async fn greet(stream: &mut TcpStream, greeting: &[u8]) -> [u8; 2] {
    stream.write_all(greeting).await.unwrap();
    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Send a CONNECT request and return the 10-byte reply
pub async fn request(stream: &mut TcpStream, request: &[u8]) -> [u8; 10] {
    stream.write_all(request).await.unwrap();
    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    reply
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socksrelay::socks::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a password auth method selection request
    pub fn create_auth_request_password() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_PASSWORD]
    }

    /// Create a username/password subnegotiation message
    pub fn create_credentials(username: &str, password: &str) -> Vec<u8> {
        let mut msg = vec![SOCKS5_AUTH_VERSION, username.len() as u8];
        msg.extend_from_slice(username.as_bytes());
        msg.push(password.len() as u8);
        msg.extend_from_slice(password.as_bytes());
        msg
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }
}
