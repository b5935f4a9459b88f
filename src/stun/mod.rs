//! Public address discovery
//!
//! Sends a STUN Binding Request (RFC 5389) over UDP and reads the mapped
//! address the server saw. The result is only printed in the startup
//! banner; a failed probe never affects the SOCKS5 server.

use crate::config::StunConfig;
use crate::error::StunError;
use bytes::{Buf, BufMut, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Fixed magic cookie of every STUN message
pub const MAGIC_COOKIE: u32 = 0x2112_A442;

const HEADER_LEN: usize = 20;
const BINDING_REQUEST: u16 = 0x0001;
const BINDING_SUCCESS: u16 = 0x0101;
const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
const FAMILY_IPV4: u8 = 0x01;
const FAMILY_IPV6: u8 = 0x02;

/// Transaction identifier of a STUN request
pub type TransactionId = [u8; 12];

/// Address family to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl IpFamily {
    /// IP version number
    pub fn version(self) -> u8 {
        match self {
            IpFamily::V4 => 4,
            IpFamily::V6 => 6,
        }
    }

    fn matches(self, addr: &SocketAddr) -> bool {
        match self {
            IpFamily::V4 => addr.is_ipv4(),
            IpFamily::V6 => addr.is_ipv6(),
        }
    }

    fn unspecified(self) -> SocketAddr {
        match self {
            IpFamily::V4 => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpFamily::V6 => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        }
    }
}

/// Public addresses found at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicAddrs {
    /// Public IPv4 address, if discovered
    pub v4: Option<IpAddr>,
    /// Public IPv6 address, if discovered
    pub v6: Option<IpAddr>,
}

/// Encode a Binding Request
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0 0|     STUN Message Type     |         Message Length        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         Magic Cookie                          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                     Transaction ID (96 bits)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
pub fn build_binding_request(transaction_id: &TransactionId) -> BytesMut {
    let mut buf = BytesMut::with_capacity(HEADER_LEN);
    buf.put_u16(BINDING_REQUEST);
    buf.put_u16(0);
    buf.put_u32(MAGIC_COOKIE);
    buf.put_slice(transaction_id);
    buf
}

/// Extract the mapped address from a Binding Response
///
/// Attributes other than MAPPED-ADDRESS and XOR-MAPPED-ADDRESS are skipped.
pub fn parse_binding_response(
    response: &[u8],
    transaction_id: &TransactionId,
) -> Result<SocketAddr, StunError> {
    if response.len() < HEADER_LEN {
        return Err(StunError::InvalidResponse("message shorter than header"));
    }

    let mut header = &response[..HEADER_LEN];
    let message_type = header.get_u16();
    let message_len = header.get_u16() as usize;
    let cookie = header.get_u32();

    if cookie != MAGIC_COOKIE {
        return Err(StunError::MagicCookieMismatch);
    }
    if header != transaction_id {
        return Err(StunError::TransactionMismatch);
    }
    if message_type != BINDING_SUCCESS {
        return Err(StunError::InvalidResponse("not a binding success response"));
    }

    let body_end = (HEADER_LEN + message_len).min(response.len());
    let mut attributes = &response[HEADER_LEN..body_end];

    while attributes.remaining() >= 4 {
        let attr_type = attributes.get_u16();
        let attr_len = attributes.get_u16() as usize;
        if attributes.remaining() < attr_len {
            return Err(StunError::InvalidResponse("truncated attribute"));
        }
        let value = &attributes[..attr_len];

        match attr_type {
            ATTR_XOR_MAPPED_ADDRESS => return decode_mapped_address(value, Some(transaction_id)),
            ATTR_MAPPED_ADDRESS => return decode_mapped_address(value, None),
            _ => {}
        }

        // Attributes are padded to a multiple of four bytes
        let padded = (attr_len + 3) & !3;
        attributes.advance(padded.min(attributes.remaining()));
    }

    Err(StunError::NoAddress)
}

/// Decode a (XOR-)MAPPED-ADDRESS value into a fresh address
///
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0 0 0 0 0 0 0 0|    Family     |           Port                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Address (32 bits or 128 bits)                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
fn decode_mapped_address(
    value: &[u8],
    xor_with: Option<&TransactionId>,
) -> Result<SocketAddr, StunError> {
    if value.len() < 4 {
        return Err(StunError::InvalidResponse("address attribute too short"));
    }

    let family = value[1];
    let addr_len = match family {
        FAMILY_IPV4 => 4,
        FAMILY_IPV6 => 16,
        other => return Err(StunError::UnknownFamily(other)),
    };
    if value.len() < 4 + addr_len {
        return Err(StunError::InvalidResponse("address attribute too short"));
    }

    let mut mask = [0u8; 16];
    if let Some(transaction_id) = xor_with {
        mask[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        mask[4..].copy_from_slice(transaction_id);
    }

    let port = u16::from_be_bytes([value[2] ^ mask[0], value[3] ^ mask[1]]);

    let mut octets = [0u8; 16];
    for (i, byte) in value[4..4 + addr_len].iter().enumerate() {
        octets[i] = byte ^ mask[i];
    }

    let ip = if family == FAMILY_IPV4 {
        IpAddr::V4(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
    } else {
        IpAddr::V6(Ipv6Addr::from(octets))
    };

    Ok(SocketAddr::new(ip, port))
}

/// Ask a STUN server which address this host appears as
pub async fn discover_public_ip(
    family: IpFamily,
    server: &str,
    timeout: Duration,
) -> Result<SocketAddr, StunError> {
    tokio::time::timeout(timeout, probe(family, server))
        .await
        .map_err(|_| StunError::Timeout)?
}

async fn probe(family: IpFamily, server: &str) -> Result<SocketAddr, StunError> {
    let server_addr = tokio::net::lookup_host(server)
        .await?
        .find(|addr| family.matches(addr))
        .ok_or(StunError::Unsupported(family.version()))?;

    let socket = UdpSocket::bind(family.unspecified())
        .await
        .map_err(|_| StunError::NoRoute(family.version()))?;
    socket
        .connect(server_addr)
        .await
        .map_err(|_| StunError::NoRoute(family.version()))?;

    let transaction_id: TransactionId = rand::random();
    socket.send(&build_binding_request(&transaction_id)).await?;

    let mut response = vec![0u8; 1024];
    let n = socket.recv(&mut response).await?;

    parse_binding_response(&response[..n], &transaction_id)
}

/// Probe both address families concurrently
///
/// Failures are logged and leave the corresponding field empty.
pub async fn discover_public_addrs(config: &StunConfig) -> PublicAddrs {
    let timeout = Duration::from_secs(config.timeout);
    let (v4, v6) = tokio::join!(
        discover_public_ip(IpFamily::V4, &config.server, timeout),
        discover_public_ip(IpFamily::V6, &config.server, timeout),
    );

    let keep = |family: IpFamily, result: Result<SocketAddr, StunError>| match result {
        Ok(addr) => Some(addr.ip()),
        Err(e) => {
            debug!("IPv{} public address probe failed: {}", family.version(), e);
            None
        }
    };

    PublicAddrs {
        v4: keep(IpFamily::V4, v4),
        v6: keep(IpFamily::V6, v6),
    }
}

/// Probe in the background and log whatever is found
///
/// Returns immediately so a slow STUN server never holds up the listener.
pub fn spawn_public_addr_report(config: StunConfig) -> JoinHandle<PublicAddrs> {
    tokio::spawn(async move {
        let public = discover_public_addrs(&config).await;
        if let Some(ip) = public.v4 {
            info!("Public IPv4: {}", ip);
        }
        if let Some(ip) = public.v6 {
            info!("Public IPv6: {}", ip);
        }
        public
    })
}
