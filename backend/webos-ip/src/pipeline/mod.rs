//! The serialized command pipeline.
//!
//! A single worker drains the [`queue`], waits for the rate limiter, performs
//! the round trip through the [`ConnectionManager`], and folds known replies
//! into the device state. It is the only writer of that state.
//!
//! On a transport failure the worker stops dequeueing and re-dials with
//! capped exponential backoff until the TV comes back or the client closes.

pub mod queue;
pub mod response;
pub mod tasks;

pub use queue::{CommandQueue, QUEUE_CAPACITY};
pub use response::{STATE_QUERIES, apply_response};

use crate::connection::{ConnectionManager, Connector};
use crate::state::DeviceState;

use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep as TokioSleep};
use tokio_util::sync::CancellationToken;

/// Minimum spacing between two transmissions.
pub const SEND_INTERVAL: Duration = Duration::from_millis(10);
pub const RECONNECT_INITIAL_INTERVAL: Duration = Duration::from_millis(100);
pub const RECONNECT_MAX_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Reconnect schedule: 100 ms doubling to a five minute ceiling, no jitter,
/// never giving up.
pub fn reconnect_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: RECONNECT_INITIAL_INTERVAL,
        initial_interval: RECONNECT_INITIAL_INTERVAL,
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: RECONNECT_MAX_INTERVAL,
        max_elapsed_time: None,
        ..Default::default()
    }
}

pub struct Pipeline<C: Connector> {
    connection: Arc<ConnectionManager<C>>,
    commands: mpsc::Receiver<String>,
    state: watch::Sender<DeviceState>,
    shutdown: CancellationToken,
}

impl<C: Connector> Pipeline<C> {
    pub fn new(
        connection: Arc<ConnectionManager<C>>,
        commands: mpsc::Receiver<String>,
        state: watch::Sender<DeviceState>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connection,
            commands,
            state,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        // Token bucket of depth one, refilled every SEND_INTERVAL.
        let mut limiter = interval_at(Instant::now() + SEND_INTERVAL, SEND_INTERVAL);
        limiter.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let command = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = limiter.tick() => {}
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = self.process(&command) => {}
            }
        }

        debug!("Command pipeline for {} stopped", self.connection.address());
    }

    async fn process(&self, command: &str) {
        match self.connection.send(command).await {
            Ok(response) => {
                debug!("Command {command:?} answered with {response:?}");
                self.state
                    .send_if_modified(|state| apply_response(command, &response, state));
            }
            Err(e) if !e.is_transport() => {
                error!("Discarding reply to {command:?}: {e}");
            }
            Err(e) => {
                self.connection.mark_disconnected();
                error!("Cannot send command {command:?}: {e}");
                self.reconnect().await;
            }
        }
    }

    /// Re-dial until connected or closed. The first attempt is immediate.
    async fn reconnect(&self) {
        let mut backoff = reconnect_backoff();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let result = tokio::select! {
                _ = self.shutdown.cancelled() => return,
                result = self.connection.connect() => result,
            };

            match result {
                Ok(()) => {
                    info!(
                        "Reconnected to {} after {attempt} attempt(s)",
                        self.connection.address()
                    );
                    return;
                }
                Err(e) => {
                    warn!("Connection attempt {attempt} failed: {e}");
                }
            }

            let delay = backoff.next_backoff().unwrap_or(RECONNECT_MAX_INTERVAL);
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = TokioSleep(delay) => {}
            }
        }
    }
}
