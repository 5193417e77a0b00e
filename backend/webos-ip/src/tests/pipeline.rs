use crate::error::client::ClientError;
use crate::pipeline::queue::{self, QUEUE_CAPACITY};
use crate::pipeline::{RECONNECT_MAX_INTERVAL, reconnect_backoff};

use std::time::Duration;

use backoff::backoff::Backoff;
use tokio_util::sync::CancellationToken;

// next_backoff may add up to a nanosecond even without jitter.
fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(1),
        "expected ~{expected:?}, got {actual:?}"
    );
}

/// **VALUE**: Verifies the reconnect schedule doubles from 100 ms and caps at 5 minutes.
///
/// **WHY THIS MATTERS**: Retrying too fast hammers a TV that is rebooting; retrying too
/// slowly leaves the UI dead long after the TV is back.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Jitter left enabled (non-deterministic waits)
/// - A max elapsed time that makes the loop give up
/// - A missing ceiling
#[test]
fn given_reconnect_backoff_when_iterated_then_doubles_until_capped() {
    // GIVEN: A fresh schedule
    let mut backoff = reconnect_backoff();

    // WHEN/THEN: First waits double
    for expected_ms in [100, 200, 400, 800, 1600, 3200] {
        let delay = backoff.next_backoff().expect("schedule never ends");
        assert_close(delay, Duration::from_millis(expected_ms));
    }

    // WHEN/THEN: Eventually pinned at the ceiling, never exhausted
    let mut last = Duration::ZERO;
    for _ in 0..50 {
        last = backoff.next_backoff().expect("schedule never ends");
        assert!(last <= RECONNECT_MAX_INTERVAL + Duration::from_millis(1));
    }
    assert_close(last, RECONNECT_MAX_INTERVAL);
}

/// **VALUE**: Verifies best-effort sends give up on a full queue.
///
/// **WHY THIS MATTERS**: The poll task must never stall behind a disconnected pipeline.
///
/// **BUG THIS CATCHES**: Would catch `offer` blocking like `push`.
#[tokio::test(start_paused = true)]
async fn given_full_queue_when_offering_then_drops_after_wait() {
    // GIVEN: A queue filled to capacity with no consumer
    let shutdown = CancellationToken::new();
    let (queue, _rx) = queue::channel(shutdown);
    for i in 0..QUEUE_CAPACITY {
        assert!(queue.offer(format!("CMD {i}"), Duration::from_millis(100)).await);
    }

    // WHEN: Offering one more
    let start = tokio::time::Instant::now();
    let accepted = queue.offer("OVERFLOW", Duration::from_millis(100)).await;

    // THEN: Dropped after the wait elapsed
    assert!(!accepted);
    assert!(start.elapsed() >= Duration::from_millis(100));
}

/// **VALUE**: Verifies must-succeed sends wait until cancelled and report it.
///
/// **WHY THIS MATTERS**: User actions like power off must either be queued or fail
/// loudly, never vanish.
///
/// **BUG THIS CATCHES**: Would catch `push` returning Ok when nothing was enqueued.
#[tokio::test(start_paused = true)]
async fn given_full_queue_when_pushing_then_cancellation_returns_error() {
    // GIVEN: A full queue
    let shutdown = CancellationToken::new();
    let (queue, mut rx) = queue::channel(shutdown.clone());
    for i in 0..QUEUE_CAPACITY {
        queue
            .push(format!("CMD {i}"), &CancellationToken::new())
            .await
            .expect("space available");
    }

    // WHEN: Pushing with a token cancelled later
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        canceller.cancel();
    });
    let result = queue.push("POWER off", &cancel).await;

    // THEN: Cancelled, and the command never reached the queue
    assert!(matches!(result, Err(ClientError::Cancelled { .. })));
    let mut drained = Vec::new();
    while let Ok(command) = rx.try_recv() {
        drained.push(command);
    }
    assert_eq!(drained.len(), QUEUE_CAPACITY);
    assert!(!drained.iter().any(|c| c == "POWER off"));
}

/// **VALUE**: Verifies a push waits for space rather than failing.
///
/// **WHY THIS MATTERS**: A momentarily busy pipeline must not reject user actions.
///
/// **BUG THIS CATCHES**: Would catch `push` using a short timeout like `offer`.
#[tokio::test(start_paused = true)]
async fn given_full_queue_when_consumer_frees_space_then_push_succeeds() {
    // GIVEN: A full queue
    let (queue, mut rx) = queue::channel(CancellationToken::new());
    for i in 0..QUEUE_CAPACITY {
        assert!(queue.offer(format!("CMD {i}"), Duration::from_millis(100)).await);
    }

    // WHEN: A consumer frees one slot after 2 s
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        let _ = rx.recv().await;
        // Keep the receiver alive so the push can land.
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(rx);
    });

    // THEN: The push completes
    let result = queue.push("POWER off", &CancellationToken::new()).await;
    assert!(result.is_ok());
}

/// **VALUE**: Verifies closing the client unblocks pending pushes.
///
/// **WHY THIS MATTERS**: A caller stuck in `must_send` would otherwise hang forever
/// after `close`.
///
/// **BUG THIS CATCHES**: Would catch `push` ignoring the shutdown token.
#[tokio::test(start_paused = true)]
async fn given_shutdown_when_pushing_then_returns_cancelled() {
    // GIVEN: A full queue and a shutdown that fires later
    let shutdown = CancellationToken::new();
    let (queue, _rx) = queue::channel(shutdown.clone());
    for i in 0..QUEUE_CAPACITY {
        assert!(queue.offer(format!("CMD {i}"), Duration::from_millis(100)).await);
    }
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    // WHEN
    let result = queue.push("POWER off", &CancellationToken::new()).await;

    // THEN
    assert!(matches!(result, Err(ClientError::Cancelled { .. })));
    assert!(!queue.offer("MUTE_STATE", Duration::from_millis(100)).await);
}
