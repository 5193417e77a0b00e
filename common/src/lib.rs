//! Shared building blocks for the webos-ip workspace.
//!
//! Everything here is free of protocol knowledge: location-tracked errors
//! and a secret wrapper that keeps the TV pairing key out of logs.
//!
//! ## Architecture
//!
//! - **common** (this crate): error plumbing and secret handling
//! - **webos-ip**: codec, connection, pipeline and client facade
//! - **webos-console**: console front-end wiring the client to stdin

pub mod error;
pub mod redacted_key;

pub use error::error_location::ErrorLocation;
pub use error::redact_error::RedactError;
pub use redacted_key::RedactedKey;

#[cfg(test)]
mod tests;
