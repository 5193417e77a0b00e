//! The client facade.
//!
//! Constructing a [`Client`] derives the session key and starts three
//! background tasks on the current tokio runtime:
//!
//! 1. the initial connect loop, retrying every second until the TV answers
//! 2. the state poll, enqueueing the query battery every five seconds
//! 3. the command pipeline, the single consumer of the queue
//!
//! All three share one root [`CancellationToken`]. [`Client::close`] cancels
//! it, waits for the tasks and releases the socket.

pub mod input;

pub use input::input_command;

use crate::codec::Codec;
use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, Connector, TcpConnector};
use crate::error::client::ClientError;
use crate::error::wake::WakeError;
use crate::pipeline::queue::{self, CommandQueue};
use crate::pipeline::tasks::{OFFER_TIMEOUT, connect_until_ready, poll_state};
use crate::pipeline::Pipeline;
use crate::state::DeviceState;
use crate::wake::{DEFAULT_WAKE_TIMEOUT, wake};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use log::{debug, info, warn};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout as TokioTimeout, timeout_at};
use tokio_util::sync::CancellationToken;

pub const CHANGE_INPUT_TIMEOUT: Duration = Duration::from_secs(10);
pub const CHANGE_INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const POWER_OFF_TIMEOUT: Duration = Duration::from_secs(5);

const POWER_OFF_COMMAND: &str = "POWER off";
const KEY_ACTION_COMMAND: &str = "KEY_ACTION";

pub struct Client<C: Connector = TcpConnector> {
    connection: Arc<ConnectionManager<C>>,
    queue: CommandQueue,
    state: watch::Receiver<DeviceState>,
    hardware_address: Option<String>,
    shutdown: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Client {
    /// Create a client talking TCP to `config.address`.
    ///
    /// Returns immediately; the connection is established in the background.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, the key cannot be derived, or there is
    /// no tokio runtime to spawn the background tasks on.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let connector = TcpConnector::new(config.address.clone());
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> Client<C> {
    /// Create a client over a custom transport.
    pub fn with_connector(config: ClientConfig, connector: C) -> Result<Self, ClientError> {
        config.validate()?;
        let codec = Codec::new(&config.pairing_key)?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| ClientError::Runtime {
            message: format!("client must be created inside a tokio runtime: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let shutdown = CancellationToken::new();
        let connection = Arc::new(ConnectionManager::new(connector, codec));
        let (queue, commands) = queue::channel(shutdown.clone());
        let (state_tx, state_rx) = watch::channel(DeviceState::default());

        let pipeline = Pipeline::new(connection.clone(), commands, state_tx, shutdown.clone());
        let tasks = vec![
            runtime.spawn(connect_until_ready(connection.clone(), shutdown.clone())),
            runtime.spawn(poll_state(connection.clone(), queue.clone(), shutdown.clone())),
            runtime.spawn(pipeline.run()),
        ];

        info!("Client for {} started", connection.address());

        Ok(Self {
            connection,
            queue,
            state: state_rx,
            hardware_address: config.hardware_address,
            shutdown,
            tasks: Mutex::new(tasks),
        })
    }

    pub fn address(&self) -> &str {
        self.connection.address()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Best-effort send.
    ///
    /// Waits at most 100 ms for queue space and otherwise drops the command.
    /// Returns whether the command was enqueued.
    pub async fn send(&self, command: impl Into<String>) -> bool {
        self.queue.offer(command, OFFER_TIMEOUT).await
    }

    /// Enqueue `command`, waiting for space until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] when `cancel` fires or the client is
    /// closed before the command is accepted.
    pub async fn must_send(
        &self,
        cancel: &CancellationToken,
        command: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.queue.push(command, cancel).await
    }

    /// Snapshot of the last-known device state.
    pub fn get_state(&self) -> DeviceState {
        self.state.borrow().clone()
    }

    /// Press a remote control button, best-effort.
    pub async fn press_button(&self, name: &str) -> Result<(), ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::InvalidInput {
                message: String::from("button name must not be empty"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.send(format!("{KEY_ACTION_COMMAND} {name}")).await;
        Ok(())
    }

    /// Switch to the named input and wait until the TV reports it.
    ///
    /// The TV does not acknowledge input changes, so the command is re-sent
    /// every 100 ms until the foreground app contains `name`, for at most
    /// ten seconds.
    pub async fn change_input(&self, name: &str) -> Result<(), ClientError> {
        let command = input_command(name)?;
        debug!("Input {name:?} resolved to {command:?}");

        let deadline = Instant::now() + CHANGE_INPUT_TIMEOUT;
        let cancel = self.shutdown.child_token();

        let switched = self.switch_input(name, &command, &cancel);

        match timeout_at(deadline, switched).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                message: format!("timed out waiting for input change: {name:?}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Send the power-off command, giving up after five seconds.
    pub async fn power_off(&self) -> Result<(), ClientError> {
        let cancel = self.shutdown.child_token();
        match TokioTimeout(POWER_OFF_TIMEOUT, self.must_send(&cancel, POWER_OFF_COMMAND)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                message: format!("power off not accepted within {POWER_OFF_TIMEOUT:?}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Wake the TV with a magic packet to every known hardware address.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoHardwareAddress`] without touching the network
    /// when no address is known, and [`ClientError::Wake`] when every
    /// broadcast failed.
    pub async fn power_on(&self) -> Result<(), ClientError> {
        let addresses = self.hardware_addresses();
        if addresses.is_empty() {
            return Err(ClientError::NoHardwareAddress {
                message: String::from(
                    "a hardware address must be known or configured to send a wake packet",
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let results = join_all(
            addresses
                .iter()
                .map(|address| wake(address, DEFAULT_WAKE_TIMEOUT)),
        )
        .await;

        summarize_wake(&addresses, results)
    }

    /// Stop the background tasks and close the connection.
    ///
    /// Pending and future sends fail or are dropped. Calling this again is a
    /// no-op.
    pub async fn close(&self) {
        self.shutdown.cancel();

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                debug!("Background task ended abnormally: {e}");
            }
        }

        self.connection.close().await;
        info!("Client for {} closed", self.connection.address());
    }

    async fn switch_input(
        &self,
        name: &str,
        command: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        self.queue.push(command, cancel).await?;

        let mut ticker = interval(CHANGE_INPUT_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ClientError::Cancelled {
                        message: format!("client closed while switching to {name:?}"),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                _ = ticker.tick() => {}
            }

            if self.state.borrow().current_app.contains(name) {
                return Ok(());
            }
            self.send(command).await;
        }
    }

    fn hardware_addresses(&self) -> Vec<String> {
        let state = self.state.borrow();
        merge_hardware_addresses(state.hardware_addresses(), self.hardware_address.as_deref())
    }
}

/// Reported addresses first, then the configured one, lowercased and deduplicated.
pub(crate) fn merge_hardware_addresses<'a>(
    reported: impl Iterator<Item = &'a str>,
    configured: Option<&'a str>,
) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for address in reported.chain(configured) {
        let address = address.trim().to_lowercase();
        if !address.is_empty() && !unique.contains(&address) {
            unique.push(address);
        }
    }
    unique
}

/// Succeeds when at least one wake packet went out.
#[track_caller]
pub(crate) fn summarize_wake(
    addresses: &[String],
    results: Vec<Result<(), WakeError>>,
) -> Result<(), ClientError> {
    let mut failures = Vec::new();
    for (address, result) in addresses.iter().zip(results) {
        match result {
            Ok(()) => info!("Sent wake packet to {address}"),
            Err(e) => {
                warn!("Wake packet to {address} failed: {e}");
                failures.push(format!("{address}: {e}"));
            }
        }
    }

    if failures.len() == addresses.len() {
        return Err(ClientError::Wake {
            message: failures.join("; "),
            location: ErrorLocation::from(Location::caller()),
        });
    }
    Ok(())
}

impl<C: Connector> Drop for Client<C> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
