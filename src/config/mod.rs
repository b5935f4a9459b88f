//! Configuration module for Socksrelay
//!
//! This module provides configuration types and parsing for the relay.
//! The configuration is built once at startup and shared read-only by
//! every session afterwards.

mod server;
mod transport;

pub use server::{Credentials, ServerConfig, SocksConfig, StunConfig};
pub use transport::TcpConfig;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<ServerConfig> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}
