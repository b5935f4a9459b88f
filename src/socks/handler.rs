//! Main SOCKS5 session handler
//!
//! This module provides the entry point for serving one accepted
//! connection. It runs authentication, request parsing, dialing and the
//! relay strictly in that order and stops at the first failing stage.

use crate::config::SocksConfig;
use crate::error::{ProtocolError, SocksError};
use crate::socks::auth::authenticate;
use crate::socks::command::{parse_request, send_failure};
use crate::socks::dialer::{connect_target, Dialer};
use crate::socks::relay::{relay, RelayStats};
use crate::socks::types::TargetAddr;
use crate::transport::SocksStream;
use tracing::{debug, info};

/// Handle SOCKS5 protocol on a stream
///
/// # Protocol Flow
///
/// 1. Method negotiation and optional username/password check
/// 2. CONNECT request parsing
/// 3. Destination dial and CONNECT reply
/// 4. Bidirectional relay until either side closes
///
/// Steps 1 and 2 share the handshake deadline; the dial is bounded by the
/// dialer's own timeout; the relay has no deadline.
///
/// # Returns
///
/// Relay statistics once both directions have finished, or the error that
/// ended the session. Dropping the stream on return closes the client.
pub async fn handle_socks5_on_stream<S, D>(
    mut stream: S,
    config: &SocksConfig,
    dialer: &D,
) -> Result<RelayStats, SocksError>
where
    S: SocksStream,
    D: Dialer,
{
    let target = match tokio::time::timeout(
        config.handshake_deadline(),
        negotiate(&mut stream, config),
    )
    .await
    {
        Ok(Ok(target)) => target,
        Ok(Err(e)) => {
            if config.reply_on_error && is_request_rejection(&e) {
                let _ = send_failure(&mut stream, &e).await;
            }
            return Err(e);
        }
        Err(_) => return Err(SocksError::Timeout("handshake")),
    };

    if config.log_connections {
        info!("Connect: {}", target);
    } else {
        debug!("Connect: {}", target);
    }

    let destination = connect_target(&mut stream, dialer, &target, config.reply_on_error).await?;

    Ok(relay(stream, destination).await)
}

/// Authenticate, then read the CONNECT request
async fn negotiate<S>(stream: &mut S, config: &SocksConfig) -> Result<TargetAddr, SocksError>
where
    S: SocksStream,
{
    let auth_method = authenticate(stream, config).await?;
    debug!("Authentication completed with method: {:?}", auth_method);

    parse_request(stream).await
}

/// Request errors answered with a failure reply
fn is_request_rejection(error: &SocksError) -> bool {
    matches!(
        error,
        SocksError::Protocol(
            ProtocolError::UnsupportedCommand(_) | ProtocolError::InvalidAddressType(_)
        ) | SocksError::Dial { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::socks::consts::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

    /// Dialer handing out in-memory pipes and recording every dial
    #[derive(Default)]
    struct PipeDialer {
        dials: AtomicUsize,
        remote: Mutex<Option<DuplexStream>>,
    }

    #[async_trait]
    impl Dialer for PipeDialer {
        type Stream = DuplexStream;

        async fn dial(&self, _target: &TargetAddr) -> Result<Self::Stream, SocksError> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            let (local, remote) = duplex(1024);
            *self.remote.lock().unwrap() = Some(remote);
            Ok(local)
        }
    }

    fn connect_request_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut data = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        data.extend_from_slice(&ip);
        data.extend_from_slice(&port.to_be_bytes());
        data
    }

    fn auth_config() -> SocksConfig {
        SocksConfig {
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_session_no_auth_relays() {
        let (mut client, server) = duplex(1024);
        let config = SocksConfig::default();
        let dialer = std::sync::Arc::new(PipeDialer::default());

        let session = {
            let dialer = dialer.clone();
            tokio::spawn(async move { handle_socks5_on_stream(server, &config, dialer.as_ref()).await })
        };

        client.write_all(&[5, 1, 0]).await.unwrap();
        let mut reply = [0u8; 2];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [5, 0]);

        client
            .write_all(&connect_request_ipv4([127, 0, 0, 1], 80))
            .await
            .unwrap();
        let mut reply = [0u8; 10];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [5, 0, 0, 1, 0, 0, 0, 0, 0, 0]);

        let mut remote = dialer.remote.lock().unwrap().take().unwrap();
        client.write_all(b"PING").await.unwrap();
        let mut buf = [0u8; 4];
        remote.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"PING");

        drop(client);
        let stats = tokio::time::timeout(Duration::from_secs(1), session)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(stats.client_to_target, 4);
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_bad_credentials_never_dials() {
        let (mut client, server) = duplex(1024);
        let dialer = PipeDialer::default();

        client.write_all(&[5, 1, 2]).await.unwrap();
        client
            .write_all(&[1, 4, b'u', b's', b'e', b'r', 3, b'b', b'a', b'd'])
            .await
            .unwrap();
        client
            .write_all(&connect_request_ipv4([127, 0, 0, 1], 80))
            .await
            .unwrap();

        let err = handle_socks5_on_stream(server, &auth_config(), &dialer)
            .await
            .unwrap_err();
        assert!(matches!(err, SocksError::Auth(AuthError::InvalidCredentials)));
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 0);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, vec![5, 2, 1, 1]);
    }

    #[tokio::test]
    async fn test_session_invalid_address_type_never_dials() {
        let (mut client, server) = duplex(1024);
        let dialer = PipeDialer::default();

        client.write_all(&[5, 1, 0]).await.unwrap();
        client
            .write_all(&[5, 1, 0, 0x02, 127, 0, 0, 1, 0, 80])
            .await
            .unwrap();

        let err = handle_socks5_on_stream(server, &SocksConfig::default(), &dialer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SocksError::Protocol(ProtocolError::InvalidAddressType(0x02))
        ));
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 0);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, vec![5, 0, 5, 8, 0, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_session_non_utf8_domain_never_dials() {
        let (mut client, server) = duplex(1024);
        let dialer = PipeDialer::default();

        client.write_all(&[5, 1, 0]).await.unwrap();
        client
            .write_all(&[5, 1, 0, SOCKS5_ADDR_TYPE_DOMAIN, 2, 0xC3, 0x28, 0, 80])
            .await
            .unwrap();

        let err = handle_socks5_on_stream(server, &SocksConfig::default(), &dialer)
            .await
            .unwrap_err();
        assert!(matches!(err, SocksError::Dial { .. }));
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 0);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, vec![5, 0, 5, 1, 0, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_session_udp_associate_rejected() {
        let (mut client, server) = duplex(1024);
        let dialer = PipeDialer::default();
        let config = SocksConfig {
            reply_on_error: false,
            ..Default::default()
        };

        client.write_all(&[5, 1, 0]).await.unwrap();
        client
            .write_all(&[5, SOCKS5_CMD_UDP_ASSOCIATE, 0, 1, 0, 0, 0, 0, 0, 0])
            .await
            .unwrap();

        let err = handle_socks5_on_stream(server, &config, &dialer)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SocksError::Protocol(ProtocolError::UnsupportedCommand(3))
        ));
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 0);

        // Only the method selection went out
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, vec![5, 0]);
    }

    #[tokio::test]
    async fn test_session_handshake_timeout() {
        let (mut client, server) = duplex(1024);
        let dialer = PipeDialer::default();
        let config = SocksConfig {
            handshake_timeout: 1,
            ..Default::default()
        };

        // Greeting arrives, request never does
        client.write_all(&[5, 1, 0]).await.unwrap();

        let err = handle_socks5_on_stream(server, &config, &dialer)
            .await
            .unwrap_err();
        assert!(matches!(err, SocksError::Timeout("handshake")));
        assert_eq!(dialer.dials.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_short_greeting() {
        let (mut client, server) = duplex(1024);
        client.write_all(&[5]).await.unwrap();
        drop(client);

        let err = handle_socks5_on_stream(server, &SocksConfig::default(), &PipeDialer::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SocksError::ShortRead {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }
}
