use webos_console::command::ConsoleCommand;
use webos_console::error::ConsoleError;
use webos_console::logger::initialize as LoggerInitialize;

use webos_ip::{Client, ClientConfig};

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::panic::Location;

use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

const APP_DIR_NAME: &str = "webos-console";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ConsoleError> {
    let log_dir = log_dir()?;
    create_dir_all(&log_dir).map_err(|e| ConsoleError::Console {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    LoggerInitialize(&log_dir)?;
    info!("Log directory: {}", log_dir.display());

    // An optional JSON config path; otherwise .env / environment.
    let config = match std::env::args_os().nth(1) {
        Some(path) => ClientConfig::load(Path::new(&path)),
        None => ClientConfig::from_env(),
    }
    .map_err(|e| ConsoleError::Core {
        message: format!("Failed to load configuration: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let client = Client::new(config).map_err(|e| ConsoleError::Core {
        message: format!("Failed to create client: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    info!("Controlling TV at {}", client.address());
    println!("webos console for {} - type `help`", client.address());

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                client.close().await;
                return Err(ConsoleError::Console {
                    message: format!("Failed to read stdin: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match command.execute(&client).await {
            Ok(output) => println!("{output}"),
            Err(e) => {
                error!("{command:?} failed: {e}");
                println!("{e}");
            }
        }

        if command == ConsoleCommand::Quit {
            break;
        }
    }

    client.close().await;
    Ok(())
}

fn log_dir() -> Result<PathBuf, ConsoleError> {
    let base = dirs::data_local_dir().ok_or_else(|| ConsoleError::Console {
        message: String::from("Failed to determine local data directory"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    Ok(base.join(APP_DIR_NAME).join("logs"))
}
