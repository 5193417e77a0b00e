//! Client for the encrypted IP control protocol of webOS televisions.
//!
//! Commands are short ASCII strings sent over one persistent TCP session on
//! port 9761. Every frame is AES encrypted with a key derived from the pairing
//! key shown on the TV. When the TV is in standby it is woken with a
//! Wake-on-LAN magic packet instead.
//!
//! The entry point is [`Client`].

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod wake;

#[cfg(test)]
mod tests;

pub use client::Client;
pub use codec::Codec;
pub use config::ClientConfig;
pub use connection::{Connector, DEFAULT_PORT, TcpConnector};
pub use error::CoreError;
pub use state::DeviceState;

pub use common::RedactedKey;
