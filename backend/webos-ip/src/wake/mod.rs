//! Wake-on-LAN.
//!
//! The TV drops its IP control socket while in standby, so powering it on
//! goes through a magic packet broadcast on the local segment instead.

use crate::error::wake::WakeError;

use common::ErrorLocation;

use std::fmt;
use std::net::SocketAddr;
use std::panic::Location;
use std::str::FromStr;
use std::time::Duration;

use const_format::concatcp;
use log::debug;
use tokio::net::UdpSocket;
use tokio::time::timeout as TokioTimeout;

pub const MAC_ADDRESS_LEN: usize = 6;
pub const SYNC_BYTE: u8 = 0xff;
pub const SYNC_LEN: usize = 6;
pub const ADDRESS_REPETITIONS: usize = 16;
pub const MAGIC_PACKET_LEN: usize = SYNC_LEN + MAC_ADDRESS_LEN * ADDRESS_REPETITIONS;

pub const WOL_PORT: u16 = 9;
pub const WOL_BROADCAST_ADDRESS: &str = concatcp!("255.255.255.255:", WOL_PORT);
const WOL_BIND_ADDRESS: &str = "0.0.0.0:0";

pub const DEFAULT_WAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// A 48-bit hardware address parsed from `aa:bb:cc:dd:ee:ff` notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; MAC_ADDRESS_LEN]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_ADDRESS_LEN]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; MAC_ADDRESS_LEN] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = WakeError;

    #[track_caller]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != MAC_ADDRESS_LEN {
            return Err(WakeError::Parse {
                message: format!(
                    "expected {MAC_ADDRESS_LEN} colon-separated octets in {s:?}, found {}",
                    parts.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut octets = [0u8; MAC_ADDRESS_LEN];
        for (octet, part) in octets.iter_mut().zip(parts) {
            // from_str_radix alone would accept a sign.
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(WakeError::Parse {
                    message: format!("invalid octet {part:?} in {s:?}: expected one or two hex digits"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            *octet = u8::from_str_radix(part, 16).map_err(|e| WakeError::Parse {
                message: format!("invalid octet {part:?} in {s:?}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// The 102-byte Wake-on-LAN payload for one hardware address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicPacket {
    bytes: [u8; MAGIC_PACKET_LEN],
}

impl MagicPacket {
    pub fn new(address: MacAddress) -> Self {
        let mut bytes = [SYNC_BYTE; MAGIC_PACKET_LEN];
        for chunk in bytes[SYNC_LEN..].chunks_exact_mut(MAC_ADDRESS_LEN) {
            chunk.copy_from_slice(&address.0);
        }
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Send the packet to `target` from an ephemeral port.
    ///
    /// A zero `timeout` means [`DEFAULT_WAKE_TIMEOUT`].
    pub async fn send_to(&self, target: SocketAddr, timeout: Duration) -> Result<(), WakeError> {
        let timeout = if timeout.is_zero() {
            DEFAULT_WAKE_TIMEOUT
        } else {
            timeout
        };

        let socket = UdpSocket::bind(WOL_BIND_ADDRESS).await?;
        socket.set_broadcast(true)?;

        match TokioTimeout(timeout, socket.send_to(&self.bytes, target)).await {
            Ok(sent) => {
                let sent = sent?;
                debug!("Sent {sent}-byte magic packet to {target}");
                Ok(())
            }
            Err(_) => Err(WakeError::Timeout {
                message: format!("magic packet to {target} not sent within {timeout:?}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Broadcast the packet on the local segment.
    pub async fn broadcast(&self, timeout: Duration) -> Result<(), WakeError> {
        let target: SocketAddr = WOL_BROADCAST_ADDRESS.parse().map_err(|e| WakeError::Parse {
            message: format!("invalid broadcast address {WOL_BROADCAST_ADDRESS}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;
        self.send_to(target, timeout).await
    }
}

/// Parse `address` and broadcast its magic packet.
pub async fn wake(address: &str, timeout: Duration) -> Result<(), WakeError> {
    let address: MacAddress = address.parse()?;
    MagicPacket::new(address).broadcast(timeout).await
}
