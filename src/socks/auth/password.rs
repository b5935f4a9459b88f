//! Username/password authentication handler
//!
//! Implements RFC 1929 username/password authentication for SOCKS5.

use crate::config::SocksConfig;
use crate::error::{AuthError, ProtocolError, SocksError};
use crate::socks::codec::{read_array, read_prefixed, read_vec};
use crate::socks::consts::{SOCKS5_AUTH_FAILURE, SOCKS5_AUTH_SUCCESS, SOCKS5_AUTH_VERSION};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Perform username/password authentication against the configured pair
///
/// # Protocol
///
/// Client sends:
/// ```text
/// +----+------+----------+------+----------+
/// |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
/// +----+------+----------+------+----------+
/// | 1  |  1   | 0 to 255 |  1   | 0 to 255 |
/// +----+------+----------+------+----------+
/// ```
///
/// Server responds:
/// ```text
/// +----+--------+
/// |VER | STATUS |
/// +----+--------+
/// | 1  |   1    |
/// +----+--------+
/// ```
///
/// A mismatch is answered with a failure status and reported as
/// [`AuthError::InvalidCredentials`] whichever field was wrong. Without
/// configured credentials every attempt fails.
pub async fn authenticate_password<S>(stream: &mut S, config: &SocksConfig) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let [version, username_len] = read_array::<S, 2>(stream, "auth header").await?;

    if version != SOCKS5_AUTH_VERSION {
        send_auth_result(stream, SOCKS5_AUTH_FAILURE).await?;
        return Err(ProtocolError::BadAuthVersion(version).into());
    }

    let username = read_vec(stream, username_len as usize, "username").await?;
    let password = read_prefixed(stream, "password").await?;

    let accepted = config
        .credentials()
        .is_some_and(|creds| creds.matches(&username, &password));

    if accepted {
        send_auth_result(stream, SOCKS5_AUTH_SUCCESS).await?;
        tracing::debug!(
            "Authentication successful for user: {}",
            String::from_utf8_lossy(&username)
        );
        Ok(())
    } else {
        send_auth_result(stream, SOCKS5_AUTH_FAILURE).await?;
        Err(AuthError::InvalidCredentials.into())
    }
}

/// Send authentication result to client
async fn send_auth_result<S: AsyncWrite + Unpin>(stream: &mut S, status: u8) -> std::io::Result<()> {
    stream.write_all(&[SOCKS5_AUTH_VERSION, status]).await?;
    stream.flush().await
}
