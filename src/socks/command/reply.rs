//! SOCKS5 reply builder
//!
//! Constructs SOCKS5 reply messages. The bound address is never computed;
//! every reply carries the `0.0.0.0:0` placeholder.

use crate::error::{Socks5ReplyCode, SocksError};
use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use std::net::Ipv4Addr;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Reply bytes for the given code
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | 0.0.0.0  |    0     |
/// +----+-----+-------+------+----------+----------+
/// ```
pub fn reply_bytes(code: Socks5ReplyCode) -> Vec<u8> {
    let mut reply = vec![SOCKS5_VERSION, code.into(), SOCKS5_RESERVED];
    reply.extend_from_slice(&TargetAddr::ipv4(Ipv4Addr::UNSPECIFIED, 0).to_bytes());
    reply
}

/// Build and send a SOCKS5 reply
pub async fn build_reply<S>(stream: &mut S, code: Socks5ReplyCode) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(&reply_bytes(code)).await?;
    stream.flush().await
}

/// Send the CONNECT success reply
pub async fn send_success<S>(stream: &mut S) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    build_reply(stream, Socks5ReplyCode::Succeeded).await
}

/// Send the failure reply matching an error
pub async fn send_failure<S>(stream: &mut S, error: &SocksError) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    build_reply(stream, error.reply_code()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use std::io;

    #[test]
    fn test_success_reply_is_fixed_placeholder() {
        assert_eq!(
            reply_bytes(Socks5ReplyCode::Succeeded),
            [0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_reply_bytes_various_codes() {
        let codes = [
            Socks5ReplyCode::GeneralFailure,
            Socks5ReplyCode::ConnectionRefused,
            Socks5ReplyCode::HostUnreachable,
            Socks5ReplyCode::CommandNotSupported,
        ];

        for code in codes {
            let reply = reply_bytes(code);
            assert_eq!(reply[1], u8::from(code));
            assert_eq!(&reply[3..], &[SOCKS5_ADDR_TYPE_IPV4, 0, 0, 0, 0, 0, 0]);
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut buffer = Vec::new();
        send_success(&mut buffer).await.unwrap();
        assert_eq!(buffer, reply_bytes(Socks5ReplyCode::Succeeded));
    }

    #[tokio::test]
    async fn test_send_failure_dial_refused() {
        let mut buffer = Vec::new();
        let err = SocksError::Dial {
            target: "127.0.0.1:9".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };

        send_failure(&mut buffer, &err).await.unwrap();
        assert_eq!(buffer[1], 0x05);
    }

    #[tokio::test]
    async fn test_send_failure_unsupported_command() {
        let mut buffer = Vec::new();
        let err = SocksError::from(ProtocolError::UnsupportedCommand(3));

        send_failure(&mut buffer, &err).await.unwrap();
        assert_eq!(buffer[1], 0x07);
    }
}
