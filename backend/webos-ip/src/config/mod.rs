//! Client configuration.
//!
//! One explicit structure replaces the builder-style options: the device
//! address, the pairing key shown on the TV, and an optional hardware address
//! to fall back on for Wake-on-LAN when the TV has never reported its own.
//!
//! Library log output goes through the `log` facade; the binary decides where
//! it ends up, so there is no logger field here.

use crate::connection::DEFAULT_PORT;
use crate::error::config::ConfigError;
use crate::wake::MacAddress;

use common::{ErrorLocation, RedactedKey};

use std::net::Ipv6Addr;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

pub const ENV_HOST: &str = "WEBOS_HOST";
pub const ENV_KEY: &str = "WEBOS_KEY";
pub const ENV_MAC_ADDR: &str = "WEBOS_MAC_ADDR";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// `host:port` of the TV's IP control service.
    pub address: String,
    pub pairing_key: RedactedKey,
    #[serde(default)]
    pub hardware_address: Option<String>,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>, pairing_key: RedactedKey) -> Self {
        Self {
            address: address.into(),
            pairing_key,
            hardware_address: None,
        }
    }

    /// Build a config for `host`, adding port 9761 when none is given.
    pub fn for_host(host: &str, pairing_key: RedactedKey) -> Self {
        Self::new(with_default_port(host.trim()), pairing_key)
    }

    pub fn with_hardware_address(mut self, address: impl Into<String>) -> Self {
        self.hardware_address = Some(address.into());
        self
    }

    /// Read `WEBOS_HOST`, `WEBOS_KEY` and the optional `WEBOS_MAC_ADDR`.
    ///
    /// A `.env` file in the working directory or next to the executable is
    /// loaded first; variables already set in the environment win.
    #[track_caller]
    pub fn from_env() -> Result<Self, ConfigError> {
        match try_load_dotenv() {
            Some(path) => info!("Loaded .env from: {:?}", path),
            None => info!("No .env file found, using process environment"),
        }

        let host = required_env(ENV_HOST)?;
        let key = RedactedKey::try_new(required_env(ENV_KEY)?)?;

        let mut config = Self::for_host(&host, key);
        if let Ok(mac) = std::env::var(ENV_MAC_ADDR) {
            if !mac.trim().is_empty() {
                config = config.with_hardware_address(mac.trim());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read,
    /// [`ConfigError::ParseError`] if it is not valid JSON for this structure,
    /// and [`ConfigError::ValidationError`] if a value is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file {}: {}", path.display(), e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let mut config: ClientConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON {}: {}", path.display(), e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        config.address = with_default_port(config.address.trim());

        config.validate()?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("device address must not be empty"),
            });
        }

        if self.pairing_key.as_str().trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("pairing key must not be empty"),
            });
        }

        if let Some(mac) = &self.hardware_address {
            mac.parse::<MacAddress>()
                .map_err(|e| ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("invalid hardware address: {e}"),
                })?;
        }

        Ok(())
    }
}

fn with_default_port(host: &str) -> String {
    if host.is_empty() {
        return String::new();
    }
    if host.parse::<Ipv6Addr>().is_ok() {
        return format!("[{host}]:{DEFAULT_PORT}");
    }
    if host.starts_with('[') {
        if host.ends_with(']') {
            return format!("{host}:{DEFAULT_PORT}");
        }
        return host.to_string();
    }
    match host.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => host.to_string(),
        _ => format!("{host}:{DEFAULT_PORT}"),
    }
}

#[track_caller]
fn required_env(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingValue {
            location: ErrorLocation::from(Location::caller()),
            name: name.to_string(),
        }),
    }
}

fn try_load_dotenv() -> Option<PathBuf> {
    // Try current directory first
    if let Ok(path) = dotenvy::dotenv() {
        return Some(path);
    }

    // Try executable directory
    let exe_path = std::env::current_exe().ok()?;
    let env_path = exe_path.parent()?.join(".env");
    if !env_path.exists() {
        return None;
    }
    match dotenvy::from_path(&env_path) {
        Ok(()) => Some(env_path),
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}
