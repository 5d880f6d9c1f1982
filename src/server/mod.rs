//! Transport adapter (§4.12): the only place in the crate that touches a
//! socket. `Session` has no `async fn` and performs no I/O of its own; this
//! module owns a `tokio::net::TcpListener`, spawns one task per accepted
//! connection, and drives that connection's `Session` by repeatedly reading
//! into a growable buffer and calling `on_bytes`.

mod config;

pub use config::{ServerConfig, ServerConfigBuilder};

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::session::Session;
use crate::{Error, Result};

const READ_CHUNK: usize = 4096;

/// Binds `config.bind_addr` and accepts connections until the process is
/// killed or the listener errors. `session_factory` is called once per
/// accepted connection to build the `Session` that will drive it — callers
/// typically close over per-connection state there (e.g. which file to
/// append incoming FLV bytes to).
pub async fn run<F>(config: ServerConfig, session_factory: F) -> Result<()>
where
    F: Fn(&ServerConfig) -> Session + Send + Sync + 'static,
{
    let listener = TcpListener::bind(config.bind_addr).await.map_err(Error::transport)?;
    log::info!("listening on {}", config.bind_addr);

    let config = Arc::new(config);
    let session_factory = Arc::new(session_factory);

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("accept error: {}", e);
                continue;
            }
        };
        let _ = stream.set_nodelay(true);
        log::debug!("accepted connection from {}", peer_addr);

        let config = config.clone();
        let session = (session_factory)(&config);
        tokio::spawn(async move {
            if let Err(e) = run_connection(stream, session, config.idle_timeout).await {
                if e.is_eof() {
                    log::debug!("connection from {} closed: {}", peer_addr, e);
                } else {
                    log::warn!("connection from {} ended: {}", peer_addr, e);
                }
            }
        });
    }
}

/// Drives a single connection's `Session` to completion. Every termination
/// path — clean EOF, read error, idle timeout, or a protocol error bubbled
/// up from `on_bytes` — produces an `Error` and calls `session.on_close`
/// with it exactly once before returning; a clean EOF is still surfaced as
/// an `Error::Transport` (kind `UnexpectedEof`) so `on_close` always sees
/// *why* the connection ended, not just that it did (§5, §7). `run`'s
/// caller uses `Error::is_eof` to log that case below error severity.
async fn run_connection(mut stream: TcpStream, mut session: Session, idle_timeout: std::time::Duration) -> Result<()> {
    let mut buffer: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut filled = 0usize;

    let result = loop {
        if filled == buffer.len() {
            buffer.resize(buffer.len() + READ_CHUNK, 0);
        }

        let read = match timeout(idle_timeout, stream.read(&mut buffer[filled..])).await {
            Ok(Ok(0)) => {
                break Err(Error::transport(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )))
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => break Err(Error::transport(e)),
            Err(_) => break Err(Error::transport(std::io::Error::new(std::io::ErrorKind::TimedOut, "idle timeout"))),
        };
        filled += read;

        let (consumed, reply) = match session.on_bytes(&buffer[..filled]) {
            Ok(v) => v,
            Err(e) => break Err(e),
        };

        if consumed > 0 {
            buffer.drain(0..consumed);
            filled -= consumed;
        }

        if !reply.is_empty() {
            if let Err(e) = stream.write_all(&reply).await {
                break Err(Error::transport(e));
            }
        }
    };

    session.on_close(result.as_ref().err());
    result
}
