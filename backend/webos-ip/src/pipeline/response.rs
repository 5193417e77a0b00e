//! Interpreting replies to the known query commands.

use crate::state::DeviceState;

use log::{debug, error};

pub const QUERY_MAC_ADDRESS_WIRED: &str = "GET_MACADDRESS wired";
pub const QUERY_MAC_ADDRESS_WIFI: &str = "GET_MACADDRESS wifi";
pub const QUERY_MUTE_STATE: &str = "MUTE_STATE";
pub const QUERY_CURRENT_VOLUME: &str = "CURRENT_VOL";
pub const QUERY_CURRENT_APP: &str = "CURRENT_APP";
pub const QUERY_IP_CONTROL_STATE: &str = "GET_IPCONTROL_STATE";

/// The battery of queries the poll task refreshes state with.
pub const STATE_QUERIES: [&str; 6] = [
    QUERY_MAC_ADDRESS_WIRED,
    QUERY_MAC_ADDRESS_WIFI,
    QUERY_MUTE_STATE,
    QUERY_CURRENT_VOLUME,
    QUERY_CURRENT_APP,
    QUERY_IP_CONTROL_STATE,
];

const MUTE_PREFIX: &str = "MUTE:";
const VOLUME_PREFIX: &str = "VOL:";
const APP_PREFIX: &str = "APP:";
const ACKNOWLEDGEMENT: &str = "OK";

/// Fold the reply to `command` into `state`.
///
/// Returns whether any field changed. Unknown or unparseable replies leave
/// the state untouched.
pub fn apply_response(command: &str, response: &str, state: &mut DeviceState) -> bool {
    match command {
        QUERY_MAC_ADDRESS_WIRED => replace(&mut state.mac_address_wired, response.to_string()),
        QUERY_MAC_ADDRESS_WIFI => replace(&mut state.mac_address_wifi, response.to_string()),
        QUERY_MUTE_STATE => {
            let muted = parse_on(strip(response, MUTE_PREFIX));
            replace(&mut state.mute_state, muted)
        }
        QUERY_CURRENT_VOLUME => {
            let volume = strip(response, VOLUME_PREFIX);
            if volume.is_empty() {
                return false;
            }
            match volume.parse::<i64>() {
                Ok(volume) => replace(&mut state.current_volume, volume),
                Err(e) => {
                    error!("Cannot parse response {response:?} to {command}: {e}");
                    false
                }
            }
        }
        QUERY_CURRENT_APP => {
            replace(&mut state.current_app, strip(response, APP_PREFIX).to_string())
        }
        QUERY_IP_CONTROL_STATE => {
            if !parse_on(response) {
                error!("IP control state is off (response {response:?})");
            }
            false
        }
        _ => {
            if response != ACKNOWLEDGEMENT {
                error!("Invalid command {command:?}: response {response:?}");
            } else {
                debug!("Command {command:?} acknowledged");
            }
            false
        }
    }
}

/// The TV reports booleans as `on`/`off` in any letter case.
pub fn parse_on(value: &str) -> bool {
    value.eq_ignore_ascii_case("on")
}

// Prefixes are matched case-insensitively; replies like "mute:On" occur.
fn strip<'a>(response: &'a str, prefix: &str) -> &'a str {
    match response.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &response[prefix.len()..],
        _ => response,
    }
}

fn replace<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        return false;
    }
    *field = value;
    true
}
