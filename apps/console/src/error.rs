use common::ErrorLocation;

use thiserror::Error;

/// Errors surfaced by the console front-end.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Error from this app (logging, stdin, startup)
    #[error("Console Error: {message} {location}")]
    Console {
        message: String,
        location: ErrorLocation,
    },

    /// Error from the webos-ip client
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// A line that is not a known command
    #[error("Usage Error: {message} {location}")]
    Usage {
        message: String,
        location: ErrorLocation,
    },
}
