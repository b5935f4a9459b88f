//! # Socksrelay - Minimal SOCKS5 Relay
//!
//! Socksrelay is a small SOCKS5 server (RFC 1928) with optional
//! username/password authentication (RFC 1929). A client asks the relay to
//! reach a destination; the relay authenticates it, dials the destination
//! on its behalf and shuttles bytes both ways until either side closes.
//!
//! ## Features
//!
//! - **CONNECT only**: IPv4, IPv6 and domain-name destinations
//! - **Optional authentication**: a single configured username/password pair
//! - **Coupled shutdown**: closing either side tears down the whole session
//! - **Public address banner**: STUN probe for the host's IPv4/IPv6 address
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socksrelay::config::load_config;
//! use socksrelay::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SOCKS5 Client -> Socksrelay -> Target
//! ```
//!
//! Each accepted connection runs as its own task through greeting,
//! authentication, request parsing, dialing and relay.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;
pub mod stun;
pub mod transport;

// Re-export commonly used items
pub use config::{load_config, ServerConfig, SocksConfig};
pub use error::{AuthError, ProtocolError, SocksError, StunError};
pub use server::{run_server, Server};

/// Version of the Socksrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
