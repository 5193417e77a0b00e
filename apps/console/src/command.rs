//! Line commands understood by the console.

use crate::error::ConsoleError;

use webos_ip::Client;
use webos_ip::connection::Connector;

use common::ErrorLocation;

use std::panic::Location;

pub const HELP: &str = "\
commands:
  state            print the last known TV state
  input <name>     switch input (hdmi1-4, atv, dtv, av1, component1, youtube)
  button <name>    press a remote button, e.g. `button home`
  send <command>   send a raw IP control command
  poweron          wake the TV with a magic packet
  poweroff         turn the TV off
  help             show this text
  quit             close the connection and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    State,
    Input(String),
    Button(String),
    Send(String),
    PowerOn,
    PowerOff,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    #[track_caller]
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match (verb.to_ascii_lowercase().as_str(), rest) {
            ("state", "") => Self::State,
            ("poweron", "") => Self::PowerOn,
            ("poweroff", "") => Self::PowerOff,
            ("help" | "?", "") => Self::Help,
            ("quit" | "exit", "") => Self::Quit,
            ("input", name) if !name.is_empty() => Self::Input(name.to_string()),
            ("button", name) if !name.is_empty() => Self::Button(name.to_string()),
            ("send", raw) if !raw.is_empty() => Self::Send(raw.to_string()),
            _ => {
                return Err(ConsoleError::Usage {
                    message: format!("unrecognized command {line:?}; type `help`"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };
        Ok(Some(command))
    }

    /// Run the command against `client`, returning the text to print.
    pub async fn execute<C: Connector>(&self, client: &Client<C>) -> Result<String, ConsoleError> {
        match self {
            Self::State => {
                let state = client.get_state();
                let connection = if client.is_connected() {
                    "connected"
                } else {
                    "disconnected"
                };
                let json = serde_json::to_string_pretty(&state).map_err(|e| {
                    ConsoleError::Console {
                        message: format!("Failed to render state: {e}"),
                        location: ErrorLocation::from(Location::caller()),
                    }
                })?;
                Ok(format!("{} ({connection})\n{json}", client.address()))
            }
            Self::Input(name) => {
                client.change_input(name).await.map_err(|e| core_error(e))?;
                Ok(format!("input switched to {name}"))
            }
            Self::Button(name) => {
                client.press_button(name).await.map_err(|e| core_error(e))?;
                Ok(format!("pressed {name}"))
            }
            Self::Send(raw) => {
                if client.send(raw.as_str()).await {
                    Ok(format!("queued {raw:?}"))
                } else {
                    Ok(format!("dropped {raw:?}: queue is full or the client is closing"))
                }
            }
            Self::PowerOn => {
                client.power_on().await.map_err(|e| core_error(e))?;
                Ok(String::from("wake packet sent"))
            }
            Self::PowerOff => {
                client.power_off().await.map_err(|e| core_error(e))?;
                Ok(String::from("power off queued"))
            }
            Self::Help => Ok(HELP.to_string()),
            Self::Quit => Ok(String::from("bye")),
        }
    }
}

#[track_caller]
fn core_error(error: webos_ip::error::ClientError) -> ConsoleError {
    ConsoleError::Core {
        message: error.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
