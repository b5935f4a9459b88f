//! Server configuration types
//!
//! Defines the listener, SOCKS5 and STUN probe settings.

use super::transport::TcpConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default listen port
fn default_port() -> u16 {
    1080
}

/// Default negotiation deadline in seconds
fn default_handshake_timeout() -> u64 {
    5
}

/// Default connect deadline in seconds
fn default_connect_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_stun_server() -> String {
    "stun.cloudflare.com:3478".to_string()
}

fn default_stun_timeout() -> u64 {
    3
}

/// Top-level configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen address, empty for all interfaces
    #[serde(default)]
    pub address: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SOCKS5 engine configuration
    #[serde(default)]
    pub socks: SocksConfig,

    /// Public address probe configuration
    #[serde(default)]
    pub stun: StunConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            address: String::new(),
            port: default_port(),
            socks: SocksConfig::default(),
            stun: StunConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Address string handed to the listener
    pub fn listen_addr(&self) -> String {
        if self.address.is_empty() {
            format!("0.0.0.0:{}", self.port)
        } else if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Listen port must not be 0".to_string());
        }
        self.socks.validate()
    }
}

/// SOCKS5 engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SocksConfig {
    /// Username for SOCKS5 auth
    #[serde(default)]
    pub username: Option<String>,

    /// Password for SOCKS5 auth
    #[serde(default)]
    pub password: Option<String>,

    /// Log every client and destination at info level
    #[serde(default)]
    pub log_connections: bool,

    /// Send a failure reply before closing a rejected request
    #[serde(default = "default_true")]
    pub reply_on_error: bool,

    /// Deadline for negotiation and request parsing, in seconds
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout: u64,

    /// Deadline for dialing the destination, in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Socket options for accepted and dialed connections
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Default for SocksConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            log_connections: false,
            reply_on_error: true,
            handshake_timeout: default_handshake_timeout(),
            connect_timeout: default_connect_timeout(),
            tcp: TcpConfig::default(),
        }
    }
}

impl SocksConfig {
    /// Configured credential pair, present only when both halves are non-empty
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Credentials { username, password })
            }
            _ => None,
        }
    }

    /// Whether clients must authenticate with username/password
    pub fn auth_required(&self) -> bool {
        self.credentials().is_some()
    }

    /// Negotiation deadline
    pub fn handshake_deadline(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout)
    }

    /// Dial deadline
    pub fn connect_deadline(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let has_user = self.username.as_deref().is_some_and(|u| !u.is_empty());
        let has_pass = self.password.as_deref().is_some_and(|p| !p.is_empty());
        if has_user != has_pass {
            return Err("Username and password must be set together".to_string());
        }
        if self.handshake_timeout == 0 || self.connect_timeout == 0 {
            return Err("Timeouts must be at least one second".to_string());
        }
        Ok(())
    }
}

/// Borrowed view of the configured username/password pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    /// Expected username
    pub username: &'a str,
    /// Expected password
    pub password: &'a str,
}

impl Credentials<'_> {
    /// Exact byte comparison of both fields
    ///
    /// Both fields are always compared so the result does not depend on
    /// which one was wrong.
    pub fn matches(&self, username: &[u8], password: &[u8]) -> bool {
        let user_ok = self.username.as_bytes() == username;
        let pass_ok = self.password.as_bytes() == password;
        user_ok & pass_ok
    }
}

/// Public address probe configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StunConfig {
    /// Run the probe at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// STUN server as `host:port`
    #[serde(default = "default_stun_server")]
    pub server: String,

    /// Probe deadline in seconds
    #[serde(default = "default_stun_timeout")]
    pub timeout: u64,
}

impl Default for StunConfig {
    fn default() -> Self {
        StunConfig {
            enabled: true,
            server: default_stun_server(),
            timeout: default_stun_timeout(),
        }
    }
}
