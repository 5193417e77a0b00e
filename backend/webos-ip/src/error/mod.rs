pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod wake;

pub use client::ClientError;
pub use codec::CodecError;
pub use config::ConfigError;
pub use connection::ConnectionError;
pub use wake::WakeError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Client(#[from] client::ClientError),

    #[error(transparent)]
    Codec(#[from] codec::CodecError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Connection(#[from] connection::ConnectionError),

    #[error(transparent)]
    Wake(#[from] wake::WakeError),
}
