//! SOCKS5 authentication module
//!
//! Handles method negotiation and username/password authentication.

mod password;

pub use password::authenticate_password;

use super::codec::{read_array, read_vec};
use super::consts::*;
use crate::config::SocksConfig;
use crate::error::{ProtocolError, SocksError};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

/// Authentication method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    None,
    /// Username/password authentication
    Password,
}

impl AuthMethod {
    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::None => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Password => SOCKS5_AUTH_METHOD_PASSWORD,
        }
    }
}

/// Client greeting: version plus the offered method codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    /// Protocol version, always 5 once parsed
    pub version: u8,
    /// Offered method codes, unvalidated
    pub methods: Vec<u8>,
}

/// Read the `VER NMETHODS METHODS` greeting
pub async fn read_greeting<S>(stream: &mut S) -> Result<Greeting, SocksError>
where
    S: AsyncRead + Unpin,
{
    let [version, num_methods] = read_array::<S, 2>(stream, "greeting header").await?;

    if version != SOCKS5_VERSION {
        return Err(ProtocolError::BadVersion(version).into());
    }

    let methods = read_vec(stream, num_methods as usize, "auth methods").await?;

    Ok(Greeting { version, methods })
}

/// Select the authentication method
///
/// The choice follows server policy only. The client's offered set is not
/// consulted.
pub fn select_auth_method(config: &SocksConfig) -> AuthMethod {
    if config.auth_required() {
        AuthMethod::Password
    } else {
        AuthMethod::None
    }
}

/// Perform authentication negotiation and authentication
///
/// This function handles the complete SOCKS5 authentication flow:
/// 1. Read client's greeting
/// 2. Select the method required by configuration
/// 3. Perform username/password authentication if required
///
/// # Returns
///
/// The selected authentication method if successful
pub async fn authenticate<S>(stream: &mut S, config: &SocksConfig) -> Result<AuthMethod, SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let greeting = read_greeting(stream).await?;
    tracing::trace!("Client offered methods {:?}", greeting.methods);

    let method = select_auth_method(config);
    stream
        .write_all(&[SOCKS5_VERSION, method.to_byte()])
        .await?;
    stream.flush().await?;

    if method == AuthMethod::Password {
        authenticate_password(stream, config).await?;
    }

    Ok(method)
}
