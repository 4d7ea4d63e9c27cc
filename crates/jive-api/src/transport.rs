// One-shot TCP exchanges with the jive5ab control port.
//
// jive5ab handles one command per connection, so every exchange opens a
// fresh socket, writes the terminated command, performs a single bounded
// read, and drops the socket. The stream is owned by the exchange future,
// which closes it on every exit path, including timeouts and cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Stage};

/// Terminator appended to every command before transmission.
pub const TERMINATOR: &str = ";\n";

/// Size of the single receive buffer used for a reply.
pub const DEFAULT_MAX_REPLY_BYTES: usize = 4096;

/// Default jive5ab control port.
pub const DEFAULT_CONTROL_PORT: u16 = 2620;

/// Shared transport settings for control channel exchanges.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Host running jive5ab (normally loopback).
    pub host: String,
    /// jive5ab control port.
    pub port: u16,
    /// Bound applied to each of connect, write and read individually.
    pub timeout: Duration,
    /// Size of the receive buffer; replies are read once.
    pub max_reply_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_CONTROL_PORT,
            timeout: Duration::from_secs(1),
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
        }
    }
}

/// A channel capable of performing one command/reply exchange.
///
/// Implemented by [`TcpControlChannel`] for the real device; tests provide
/// scripted doubles.
pub trait ControlChannel: Send + Sync + 'static {
    /// Send `command` (without terminator) and return the raw reply text.
    fn send(&self, command: &str) -> impl Future<Output = Result<String, Error>> + Send;
}

/// Control channel backed by a fresh TCP connection per command.
#[derive(Debug, Clone)]
pub struct TcpControlChannel {
    config: TransportConfig,
}

impl TcpControlChannel {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// The transport settings this channel was built with.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl ControlChannel for TcpControlChannel {
    async fn send(&self, command: &str) -> Result<String, Error> {
        let command = command.trim();
        let limit = self.config.timeout;
        let timed_out = |stage| Error::Timeout {
            command: command.to_owned(),
            stage,
            timeout: limit,
        };
        let broken = |stage, source| Error::Transport {
            command: command.to_owned(),
            stage,
            source,
        };

        let mut stream = timeout(
            limit,
            TcpStream::connect((self.config.host.as_str(), self.config.port)),
        )
        .await
        .map_err(|_| timed_out(Stage::Connect))?
        .map_err(|e| broken(Stage::Connect, e))?;

        let wire = frame(command);
        timeout(limit, stream.write_all(wire.as_bytes()))
            .await
            .map_err(|_| timed_out(Stage::Write))?
            .map_err(|e| broken(Stage::Write, e))?;

        let mut buf = vec![0u8; self.config.max_reply_bytes];
        let n = timeout(limit, stream.read(&mut buf))
            .await
            .map_err(|_| timed_out(Stage::Read))?
            .map_err(|e| broken(Stage::Read, e))?;
        drop(stream);

        buf.truncate(n);
        let reply = decode_ascii(&buf);
        debug!(command, bytes = n, "control exchange complete");
        trace!(command, reply = %reply.trim_end(), "raw reply");
        Ok(reply)
    }
}

/// Terminate a command for the wire.
pub fn frame(command: &str) -> String {
    let mut wire = String::with_capacity(command.len() + TERMINATOR.len());
    wire.push_str(command.trim());
    wire.push_str(TERMINATOR);
    wire
}

/// Decode a reply as ASCII, silently dropping any non-ASCII bytes.
fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_trims_and_terminates() {
        assert_eq!(frame("  status?  "), "status?;\n");
        assert_eq!(frame("record = off"), "record = off;\n");
    }

    #[test]
    fn decode_drops_non_ascii() {
        assert_eq!(decode_ascii(b"!status? 0 \xff: ready ;"), "!status? 0 : ready ;");
    }
}
