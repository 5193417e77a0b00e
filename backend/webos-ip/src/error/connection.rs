use crate::error::codec::CodecError;

use common::ErrorLocation;

use std::io::Error as IoError;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Dial Error: {message} {location}")]
    Dial {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Not Connected Error: {message} {location}")]
    NotConnected {
        message: String,
        location: ErrorLocation,
    },

    #[error("Write Error: {message} {location}")]
    Write {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Write Timeout Error: {message} {location}")]
    WriteTimeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Read Error: {message} {location}")]
    Read {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
        #[source]
        source: CodecError,
    },
}

impl ConnectionError {
    /// Whether the error means the socket is unusable and must be re-dialed.
    ///
    /// A reply that fails to decode arrived over a working socket, so it is
    /// the only variant that leaves the connection in place.
    pub fn is_transport(&self) -> bool {
        !matches!(self, ConnectionError::Decode { .. })
    }
}
