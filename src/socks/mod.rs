//! SOCKS5 module for Socksrelay
//!
//! This module implements the per-connection SOCKS5 engine: method
//! negotiation, username/password authentication, CONNECT request parsing,
//! destination dialing and the bidirectional relay.

mod auth;
mod codec;
mod command;
mod consts;
mod dialer;
mod handler;
mod relay;
mod types;

pub use auth::{authenticate, read_greeting, select_auth_method, AuthMethod, Greeting};
pub use codec::{decode_address, read_port};
pub use command::{build_reply, parse_request, reply_bytes, send_failure, send_success};
pub use consts::*;
pub use dialer::{connect_target, Dialer, TcpDialer};
pub use handler::handle_socks5_on_stream;
pub use relay::{relay, RelayStats, RELAY_BUFFER_SIZE};
pub use types::{SocksCommand, TargetAddr};
