//! The bounded queue between producers and the pipeline worker.
//!
//! Two enqueue modes exist and they are deliberately different:
//! [`CommandQueue::offer`] gives up after a short wait and drops the command,
//! [`CommandQueue::push`] waits until the command is accepted or the caller
//! cancels.

use crate::error::client::ClientError;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const QUEUE_CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct CommandQueue {
    tx: mpsc::Sender<String>,
    shutdown: CancellationToken,
}

/// Create the queue; the receiver belongs to the pipeline worker.
pub fn channel(shutdown: CancellationToken) -> (CommandQueue, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    (CommandQueue { tx, shutdown }, rx)
}

impl CommandQueue {
    /// Best-effort enqueue.
    ///
    /// Returns `false` when the queue stayed full for `wait`, or the client is
    /// closing; the command is dropped in both cases.
    pub async fn offer(&self, command: impl Into<String>, wait: Duration) -> bool {
        let command = command.into();
        tokio::select! {
            _ = self.shutdown.cancelled() => {
                debug!("Dropping {command:?}: client is closing");
                false
            }
            sent = tokio::time::timeout(wait, self.tx.send(command.clone())) => match sent {
                Ok(Ok(())) => true,
                Ok(Err(_)) => {
                    debug!("Dropping {command:?}: pipeline has stopped");
                    false
                }
                Err(_) => {
                    debug!("Sending command {command:?} timed out after {wait:?}");
                    false
                }
            },
        }
    }

    /// Enqueue that only gives up on cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Cancelled`] if `cancel` fires, the client is
    /// closed, or the pipeline has stopped before the command was accepted.
    pub async fn push(
        &self,
        command: impl Into<String>,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        let command = command.into();
        tokio::select! {
            _ = cancel.cancelled() => Err(ClientError::Cancelled {
                message: format!("enqueue of {command:?} was cancelled"),
                location: ErrorLocation::from(Location::caller()),
            }),
            _ = self.shutdown.cancelled() => Err(ClientError::Cancelled {
                message: format!("client closed before {command:?} was enqueued"),
                location: ErrorLocation::from(Location::caller()),
            }),
            sent = self.tx.send(command.clone()) => sent.map_err(|_| ClientError::Cancelled {
                message: format!("pipeline stopped before {command:?} was enqueued"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
