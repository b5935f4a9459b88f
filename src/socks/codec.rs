//! Field readers and address decoding
//!
//! Every protocol field is read with its exact length. A peer that closes
//! early produces [`SocksError::ShortRead`] naming the field and how many
//! of its bytes arrived.

use super::consts::*;
use super::types::TargetAddr;
use crate::error::{ProtocolError, SocksError};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use tokio::io::{AsyncRead, AsyncReadExt};

async fn fill<R>(reader: &mut R, buf: &mut [u8], field: &'static str) -> Result<(), SocksError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Err(SocksError::ShortRead {
                field,
                expected: buf.len(),
                actual: filled,
            });
        }
        filled += n;
    }
    Ok(())
}

/// Read a fixed-size field
pub async fn read_array<R, const N: usize>(
    reader: &mut R,
    field: &'static str,
) -> Result<[u8; N], SocksError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; N];
    fill(reader, &mut buf, field).await?;
    Ok(buf)
}

/// Read a single byte field
pub async fn read_u8<R>(reader: &mut R, field: &'static str) -> Result<u8, SocksError>
where
    R: AsyncRead + Unpin,
{
    let [byte] = read_array::<R, 1>(reader, field).await?;
    Ok(byte)
}

/// Read a field whose length is only known at runtime
pub async fn read_vec<R>(
    reader: &mut R,
    len: usize,
    field: &'static str,
) -> Result<Vec<u8>, SocksError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; len];
    fill(reader, &mut buf, field).await?;
    Ok(buf)
}

/// Read a length-prefixed field (one length byte, then that many bytes)
pub async fn read_prefixed<R>(reader: &mut R, field: &'static str) -> Result<Vec<u8>, SocksError>
where
    R: AsyncRead + Unpin,
{
    let len = read_u8(reader, field).await? as usize;
    read_vec(reader, len, field).await
}

/// Read a big-endian port
pub async fn read_port<R>(reader: &mut R) -> Result<u16, SocksError>
where
    R: AsyncRead + Unpin,
{
    let buf = read_array::<R, 2>(reader, "port").await?;
    Ok(u16::from_be_bytes(buf))
}

/// Decode `DST.ADDR DST.PORT` for the given address type
///
/// Domain names are taken as raw bytes; names that are not valid hostnames
/// fail later, at dial time.
pub async fn decode_address<R>(addr_type: u8, reader: &mut R) -> Result<TargetAddr, SocksError>
where
    R: AsyncRead + Unpin,
{
    match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let octets = read_array::<R, 4>(reader, "IPv4 address").await?;
            let port = read_port(reader).await?;
            Ok(TargetAddr::ipv4(Ipv4Addr::from(octets), port))
        }
        SOCKS5_ADDR_TYPE_DOMAIN => {
            let name = read_prefixed(reader, "domain name").await?;
            let port = read_port(reader).await?;
            match String::from_utf8(name) {
                Ok(name) => Ok(TargetAddr::Domain(name, port)),
                // Unresolvable as sent, so it fails the way a bad name fails to dial
                Err(e) => Err(SocksError::Dial {
                    target: format!("{}:{}", e.as_bytes().escape_ascii(), port),
                    source: io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "domain name is not valid UTF-8",
                    ),
                }),
            }
        }
        SOCKS5_ADDR_TYPE_IPV6 => {
            let octets = read_array::<R, 16>(reader, "IPv6 address").await?;
            let port = read_port(reader).await?;
            Ok(TargetAddr::ipv6(Ipv6Addr::from(octets), port))
        }
        other => Err(ProtocolError::InvalidAddressType(other).into()),
    }
}
