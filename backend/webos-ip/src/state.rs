//! Last-known device attributes.
//!
//! The command pipeline owns the only `watch::Sender<DeviceState>`, which
//! makes it the single writer. Everyone else holds a receiver and takes a
//! cloned snapshot; fields may be momentarily stale relative to each other.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub mac_address_wired: String,
    pub mac_address_wifi: String,
    pub mute_state: bool,
    pub current_volume: i64,
    pub current_app: String,
}

impl DeviceState {
    /// Hardware addresses reported by the TV, wifi first, skipping unknown ones.
    pub fn hardware_addresses(&self) -> impl Iterator<Item = &str> {
        [self.mac_address_wifi.as_str(), self.mac_address_wired.as_str()]
            .into_iter()
            .filter(|addr| !addr.is_empty())
    }
}
