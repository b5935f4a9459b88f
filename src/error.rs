//! Error types for Socksrelay
//!
//! This module defines the error taxonomy of the SOCKS5 engine. Every
//! variant is local to one session: it ends that session and is logged,
//! never propagated to other sessions or to the accept loop.

use std::io;
use thiserror::Error;

/// Violations of the SOCKS5 wire protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Greeting or request carried a version other than 5
    #[error("Unsupported SOCKS version: {0}")]
    BadVersion(u8),

    /// Username/password subnegotiation carried a version other than 1
    #[error("Unsupported auth subnegotiation version: {0}")]
    BadAuthVersion(u8),

    /// Request command other than CONNECT
    #[error("Command not supported: {0}")]
    UnsupportedCommand(u8),

    /// Request address type other than IPv4, domain or IPv6
    #[error("Invalid address type: {0}")]
    InvalidAddressType(u8),
}

/// Authentication failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Username or password did not match the configured pair
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Main error type for a SOCKS5 session
#[derive(Error, Debug)]
pub enum SocksError {
    /// SOCKS5 protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Peer closed before a fixed-length field was complete
    #[error("Short read on {field}: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Name of the field being read
        field: &'static str,
        /// Number of bytes the field requires
        expected: usize,
        /// Number of bytes received before end of stream
        actual: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A stage deadline expired
    #[error("Timeout: {0}")]
    Timeout(&'static str),

    /// Destination could not be reached
    #[error("Failed to connect to {target}: {source}")]
    Dial {
        /// Endpoint string that was dialed
        target: String,
        /// Underlying connect error
        #[source]
        source: io::Error,
    },
}

impl SocksError {
    /// Reply code sent to the client when this error ends a request
    pub fn reply_code(&self) -> Socks5ReplyCode {
        match self {
            SocksError::Protocol(ProtocolError::UnsupportedCommand(_)) => {
                Socks5ReplyCode::CommandNotSupported
            }
            SocksError::Protocol(ProtocolError::InvalidAddressType(_)) => {
                Socks5ReplyCode::AddressTypeNotSupported
            }
            SocksError::Dial { source, .. } => Socks5ReplyCode::from(source),
            SocksError::Timeout(_) => Socks5ReplyCode::HostUnreachable,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}

/// Errors raised by the STUN public address probe
#[derive(Error, Debug)]
pub enum StunError {
    /// Host has no route for the requested address family
    #[error("No IPv{0} connectivity")]
    NoRoute(u8),

    /// STUN server has no address of the requested family
    #[error("The STUN server doesn't support IPv{0}")]
    Unsupported(u8),

    /// STUN server sent nothing back in time
    #[error("STUN request timed out")]
    Timeout,

    /// Response was truncated or malformed
    #[error("Invalid STUN response: {0}")]
    InvalidResponse(&'static str),

    /// Magic cookie in the response did not match
    #[error("Invalid magic cookie in STUN response")]
    MagicCookieMismatch,

    /// Transaction id in the response did not match the request
    #[error("Transaction ID mismatch in STUN response")]
    TransactionMismatch,

    /// No MAPPED-ADDRESS or XOR-MAPPED-ADDRESS attribute present
    #[error("No address attribute in STUN response")]
    NoAddress,

    /// Address attribute carried an unknown family
    #[error("Unknown address family: {0}")]
    UnknownFamily(u8),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            io::ErrorKind::TimedOut => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => Socks5ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => Socks5ReplyCode::ConnectionNotAllowed,
            _ => Socks5ReplyCode::GeneralFailure,
        }
    }
}
