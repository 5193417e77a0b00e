//! Secret handling with redacted Debug output.
//!
//! Used for the TV pairing key, which is the only input the session
//! encryption key is derived from.

use crate::{ErrorLocation, RedactError};

use std::fmt;
use std::panic::Location;

use serde::de::{Deserialize, Deserializer};
use serde::ser::Error;
use zeroize::Zeroize;

/// A secret that never exposes its value in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct RedactedKey {
    inner: String,
}

impl RedactedKey {
    /// Wrap a secret without validating it.
    pub fn new(key: impl Into<String>) -> Self {
        Self { inner: key.into() }
    }

    /// Wrap a secret, rejecting empty or whitespace-only values.
    #[track_caller]
    pub fn try_new(key: impl Into<String>) -> Result<Self, RedactError> {
        let key = Self::new(key);
        if key.inner.trim().is_empty() {
            return Err(RedactError::Empty {
                message: String::from("secret must not be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(key)
    }

    /// Get the actual secret value.
    ///
    /// # Security Note
    /// Only call this where the secret is consumed (key derivation).
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Get the secret length (safe to log).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for RedactedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedactedKey([REDACTED])")
    }
}

impl fmt::Display for RedactedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED KEY]")
    }
}

impl Drop for RedactedKey {
    fn drop(&mut self) {
        self.inner.zeroize();
    }
}

// Config files carry the key, so reading is allowed; writing it back out is not.
impl<'de> Deserialize<'de> for RedactedKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl serde::Serialize for RedactedKey {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        Err(S::Error::custom(RedactError::Serialization {
            message: String::from("RedactedKey cannot be serialized - use as_str() explicitly"),
            location: ErrorLocation::from(Location::caller()),
        }))
    }
}
