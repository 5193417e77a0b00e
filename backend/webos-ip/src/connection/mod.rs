//! Ownership of the single transport connection to the TV.
//!
//! One async mutex guards the stream, so a write/read round trip can never
//! interleave with another sender or with a reconnect swapping the stream
//! out underneath it.

use crate::codec::Codec;
use crate::error::connection::ConnectionError;

use common::ErrorLocation;

use std::future::Future;
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream, lookup_host};
use tokio::sync::Mutex;
use tokio::time::timeout as TokioTimeout;

pub const DEFAULT_PORT: u16 = 9761;
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(1);
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(5);
pub const READ_TIMEOUT: Duration = Duration::from_millis(1000);
pub const READ_BUFFER_SIZE: usize = 1024;

/// Produces fresh transport streams to the device.
///
/// The connection manager calls this on the first connect and again on
/// every reconnect; implementations should not retry internally.
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Human-readable peer address, for logs.
    fn address(&self) -> &str;

    fn connect(&self) -> impl Future<Output = Result<Self::Stream, IoError>> + Send;
}

/// Dials the TV over TCP with keep-alives enabled.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    address: String,
    dial_timeout: Duration,
}

impl TcpConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            dial_timeout: DIAL_TIMEOUT,
        }
    }

    pub fn with_dial_timeout(mut self, dial_timeout: Duration) -> Self {
        self.dial_timeout = dial_timeout;
        self
    }

    async fn dial(&self) -> Result<TcpStream, IoError> {
        let mut last_error = None;
        for addr in lookup_host(self.address.as_str()).await? {
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            socket.set_keepalive(true)?;

            match socket.connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    trace!("Dial to {addr} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            IoError::new(
                ErrorKind::NotFound,
                format!("{} did not resolve to any address", self.address),
            )
        }))
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn address(&self) -> &str {
        &self.address
    }

    async fn connect(&self) -> Result<TcpStream, IoError> {
        match TokioTimeout(self.dial_timeout, self.dial()).await {
            Ok(result) => result,
            Err(_) => Err(IoError::new(
                ErrorKind::TimedOut,
                format!("dial timed out after {:?}", self.dial_timeout),
            )),
        }
    }
}

/// Owns exactly one stream at a time and performs encrypted round trips on it.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    codec: Codec,
    stream: Mutex<Option<C::Stream>>,
    connected: AtomicBool,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, codec: Codec) -> Self {
        Self {
            connector,
            codec,
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> &str {
        self.connector.address()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Dial a new stream and swap it in.
    ///
    /// The lock is held for the whole dial so a concurrent `send` waits for
    /// the new stream instead of writing to the one being replaced.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let mut guard = self.stream.lock().await;

        info!("Attempting connection to {}", self.address());
        let stream = self
            .connector
            .connect()
            .await
            .map_err(|e| ConnectionError::Dial {
                message: format!("cannot connect to {}: {e}", self.address()),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })?;

        *guard = Some(stream);
        self.connected.store(true, Ordering::SeqCst);
        info!("Connected to {}", self.address());
        Ok(())
    }

    /// Send one command and wait for its single-line reply.
    ///
    /// Silence is not an error: when the read deadline passes or the peer
    /// closes its side, the reply is the empty string. The TV says nothing
    /// at all to commands it does not understand, and treating that as a
    /// dead socket would reconnect on every typo.
    pub async fn send(&self, command: &str) -> Result<String, ConnectionError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or_else(|| ConnectionError::NotConnected {
            message: format!("no connection to {} is established", self.address()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let frame = self.codec.encode(command.as_bytes());
        match TokioTimeout(WRITE_TIMEOUT, stream.write_all(&frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(ConnectionError::Write {
                    message: format!("cannot write {command:?}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                    source: e,
                });
            }
            Err(_) => {
                return Err(ConnectionError::WriteTimeout {
                    message: format!("writing {command:?} took longer than {WRITE_TIMEOUT:?}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        let mut buf = [0u8; READ_BUFFER_SIZE];
        let n = match TokioTimeout(READ_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => {
                debug!("Peer closed the stream after {command:?}");
                return Ok(String::new());
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                return Err(ConnectionError::Read {
                    message: format!("cannot read reply to {command:?}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                    source: e,
                });
            }
            Err(_) => {
                debug!("No reply to {command:?} within {READ_TIMEOUT:?}");
                return Ok(String::new());
            }
        };

        let plaintext = self
            .codec
            .decode(&buf[..n])
            .map_err(|e| ConnectionError::Decode {
                message: format!("cannot decode reply to {command:?}"),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })?;

        Ok(String::from_utf8_lossy(&plaintext).trim().to_string())
    }

    /// Drop the current stream, shutting down its write half first.
    pub async fn close(&self) {
        let mut guard = self.stream.lock().await;
        if let Some(mut stream) = guard.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of connection to {} failed: {e}", self.address());
            }
        }
        self.mark_disconnected();
    }
}
