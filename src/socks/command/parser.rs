//! SOCKS5 request parser
//!
//! Parses SOCKS5 command requests from the client.

use crate::error::{ProtocolError, SocksError};
use crate::socks::codec::{decode_address, read_array};
use crate::socks::consts::*;
use crate::socks::types::{SocksCommand, TargetAddr};
use tokio::io::AsyncRead;

/// Parse a SOCKS5 CONNECT request from the stream
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Only CONNECT is served. BIND, UDP ASSOCIATE and unknown commands are
/// rejected before any address bytes are consumed. No socket is opened.
pub async fn parse_request<S>(stream: &mut S) -> Result<TargetAddr, SocksError>
where
    S: AsyncRead + Unpin,
{
    let [version, cmd_byte, _reserved, addr_type] =
        read_array::<S, 4>(stream, "request header").await?;

    if version != SOCKS5_VERSION {
        return Err(ProtocolError::BadVersion(version).into());
    }

    match SocksCommand::from_byte(cmd_byte) {
        Some(SocksCommand::Connect) => {}
        Some(command) => {
            tracing::debug!("Rejecting {} request", command);
            return Err(ProtocolError::UnsupportedCommand(cmd_byte).into());
        }
        None => return Err(ProtocolError::UnsupportedCommand(cmd_byte).into()),
    }

    let target = decode_address(addr_type, stream).await?;

    tracing::debug!("Parsed SOCKS5 CONNECT to {}", target);

    Ok(target)
}
