//! Bidirectional relay
//!
//! Copies bytes between the client and the destination after a successful
//! CONNECT. Each direction runs in its own task. Whichever direction ends
//! first cancels a shared token, which stops the other one; both streams
//! are closed once both tasks have returned.

use crate::transport::SocksStream;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Copy window for each direction
pub const RELAY_BUFFER_SIZE: usize = 8192;

/// Bytes moved in each direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes copied from the client to the destination
    pub client_to_target: u64,
    /// Bytes copied from the destination to the client
    pub target_to_client: u64,
}

/// Relay data bidirectionally until either side closes
pub async fn relay<C, T>(client: C, target: T) -> RelayStats
where
    C: SocksStream,
    T: SocksStream,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (target_read, target_write) = tokio::io::split(target);
    let shutdown = CancellationToken::new();

    let upstream = tokio::spawn(pump(
        client_read,
        target_write,
        shutdown.clone(),
        "client->target",
    ));
    let downstream = tokio::spawn(pump(
        target_read,
        client_write,
        shutdown.clone(),
        "target->client",
    ));

    let (up, down) = tokio::join!(upstream, downstream);

    RelayStats {
        client_to_target: up.unwrap_or_default(),
        target_to_client: down.unwrap_or_default(),
    }
}

/// Copy one direction until EOF, error, or cancellation
async fn pump<R, W>(
    mut reader: R,
    mut writer: W,
    shutdown: CancellationToken,
    direction: &'static str,
) -> u64
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUFFER_SIZE];
    let mut copied = 0u64;

    loop {
        let n = tokio::select! {
            _ = shutdown.cancelled() => {
                trace!("{} stopped by peer direction", direction);
                break;
            }
            result = reader.read(&mut buf) => match result {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    debug!("{} read error: {}", direction, e);
                    break;
                }
            }
        };

        let written = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = writer.write_all(&buf[..n]) => result,
        };
        if let Err(e) = written {
            debug!("{} write error: {}", direction, e);
            break;
        }
        copied += n as u64;
    }

    shutdown.cancel();
    let _ = writer.shutdown().await;

    debug!("{} finished: {} bytes", direction, copied);
    copied
}
