//! Background producers that run next to the pipeline worker.

use super::queue::CommandQueue;
use super::response::STATE_QUERIES;
use crate::connection::{ConnectionManager, Connector};

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tokio_util::sync::CancellationToken;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const INITIAL_CONNECT_INTERVAL: Duration = Duration::from_secs(1);
/// How long a best-effort enqueue may wait for queue space.
pub const OFFER_TIMEOUT: Duration = Duration::from_millis(100);

/// Enqueue the state queries every [`POLL_INTERVAL`] while connected.
///
/// Never waits on replies; a full queue just drops the query until the next
/// round.
pub async fn poll_state<C: Connector>(
    connection: Arc<ConnectionManager<C>>,
    queue: CommandQueue,
    shutdown: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + POLL_INTERVAL, POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if !connection.is_connected() {
            continue;
        }
        for query in STATE_QUERIES {
            queue.offer(query, OFFER_TIMEOUT).await;
        }
    }

    debug!("State poll for {} stopped", connection.address());
}

/// Keep dialing until the first connection succeeds.
///
/// Lets a client be built while the TV is off or unreachable.
pub async fn connect_until_ready<C: Connector>(
    connection: Arc<ConnectionManager<C>>,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(INITIAL_CONNECT_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => {}
        }

        if connection.is_connected() {
            return;
        }
        let result = tokio::select! {
            _ = shutdown.cancelled() => return,
            result = connection.connect() => result,
        };
        match result {
            Ok(()) => return,
            Err(e) => error!("Connection attempt failed: {e}"),
        }
    }
}
