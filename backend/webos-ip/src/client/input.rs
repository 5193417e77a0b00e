//! Input names accepted by `change_input`.

use crate::error::client::ClientError;

use common::ErrorLocation;

use std::panic::Location;

/// Physical inputs, selected with `INPUT_SELECT`.
pub const PHYSICAL_INPUTS: [&str; 8] = [
    "hdmi1",
    "hdmi2",
    "hdmi3",
    "hdmi4",
    "atv",
    "dtv",
    "av1",
    "component1",
];

/// Inputs that are really apps, launched by identifier.
pub const APP_INPUTS: [(&str, &str); 1] = [("youtube", "youtube.leanback.v4")];

/// Resolve a human-readable input name to the command that selects it.
///
/// # Errors
///
/// Returns [`ClientError::InvalidInput`] for names outside the table.
#[track_caller]
pub fn input_command(name: &str) -> Result<String, ClientError> {
    if PHYSICAL_INPUTS.contains(&name) {
        return Ok(format!("INPUT_SELECT {name}"));
    }
    if let Some((_, app_id)) = APP_INPUTS.iter().find(|(input, _)| *input == name) {
        return Ok(format!("APP_LAUNCH {app_id}"));
    }
    Err(ClientError::InvalidInput {
        message: format!("invalid input name: {name:?}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
