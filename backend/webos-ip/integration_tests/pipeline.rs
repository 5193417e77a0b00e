use crate::helpers::{Outcome, ScriptedConnector, config, eventually};

use webos_ip::Client;
use webos_ip::pipeline::tasks::{INITIAL_CONNECT_INTERVAL, POLL_INTERVAL};
use webos_ip::pipeline::{SEND_INTERVAL, STATE_QUERIES};

use std::time::Duration;

use tokio::time::Instant;

/// **VALUE**: Verifies a failing transport is re-dialed on the 100/200/400/800 ms schedule.
///
/// **WHY THIS MATTERS**: Without backoff a dead TV is hammered with connects; without a
/// bounded first interval recovery after a blip takes far too long.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Reconnecting without waiting
/// - Waits that do not double
/// - The pipeline giving up before the transport recovers
#[tokio::test(start_paused = true)]
async fn given_broken_transport_when_sending_then_reconnects_with_exponential_backoff() {
    // GIVEN: A first connection that breaks on write, four refusals, then a working TV
    let connector = ScriptedConnector::new(
        [
            Outcome::Broken,
            Outcome::Fail,
            Outcome::Fail,
            Outcome::Fail,
            Outcome::Fail,
        ],
        Outcome::Responsive,
    );
    let tv = connector.clone();
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");
    assert!(eventually(Duration::from_secs(2), || client.is_connected()).await);

    // WHEN: A command hits the broken stream
    assert!(client.send("MUTE_STATE").await);

    // THEN: Six dials in total: the initial one plus five reconnect attempts
    assert!(
        eventually(Duration::from_secs(10), || tv.attempts().len() >= 6).await,
        "Expected six connection attempts, saw {}",
        tv.attempts().len()
    );
    assert!(eventually(Duration::from_secs(1), || client.is_connected()).await);

    let attempts = tv.attempts();
    let gaps: Vec<Duration> = attempts[1..].windows(2).map(|w| w[1] - w[0]).collect();
    for (gap, expected_ms) in gaps.iter().zip([100u64, 200, 400, 800]) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            *gap >= expected && *gap <= expected + Duration::from_millis(5),
            "expected ~{expected:?} between attempts, got {gap:?}"
        );
    }

    // THEN: The pipeline is serving again after recovery
    assert!(client.send("CURRENT_VOL").await);
    assert!(eventually(Duration::from_secs(3), || client.get_state().current_volume == 37).await);

    client.close().await;
}

/// **VALUE**: Verifies commands leave at least one rate interval apart.
///
/// **WHY THIS MATTERS**: The TV drops commands that arrive faster than it can handle.
///
/// **BUG THIS CATCHES**: Would catch the limiter being bypassed for queued bursts.
#[tokio::test(start_paused = true)]
async fn given_burst_of_commands_when_sent_then_spacing_respects_rate_limit() {
    // GIVEN: A responsive TV
    let connector = ScriptedConnector::new([], Outcome::Responsive);
    let tv = connector.clone();
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");
    assert!(eventually(Duration::from_secs(2), || client.is_connected()).await);

    // WHEN: Queueing a burst
    for i in 0..8 {
        assert!(client.send(format!("KEY_ACTION volumeup{i}")).await);
    }

    // THEN: All arrive, spaced by at least the send interval
    assert!(eventually(Duration::from_secs(2), || tv.log.commands().len() >= 8).await);
    let entries = tv.log.entries();
    for pair in entries.windows(2) {
        assert!(
            pair[1].0 - pair[0].0 >= SEND_INTERVAL,
            "{:?} followed {:?} too quickly",
            pair[1].1,
            pair[0].1
        );
    }
    let order: Vec<String> = entries.into_iter().map(|(_, c)| c).collect();
    let expected: Vec<String> = (0..8).map(|i| format!("KEY_ACTION volumeup{i}")).collect();
    assert_eq!(order, expected, "FIFO order must be preserved");

    client.close().await;
}

/// **VALUE**: Verifies silence from the TV is not treated as a dead connection.
///
/// **WHY THIS MATTERS**: The TV ignores unknown commands without replying; reconnecting
/// on every silent command would cause reconnect storms.
///
/// **BUG THIS CATCHES**: Would catch read timeouts being mapped to transport errors.
#[tokio::test(start_paused = true)]
async fn given_silent_tv_when_sending_then_connection_is_kept() {
    // GIVEN: A TV that never answers
    let connector = ScriptedConnector::new([], Outcome::Silent);
    let tv = connector.clone();
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");
    assert!(eventually(Duration::from_secs(2), || client.is_connected()).await);

    // WHEN: Several commands go unanswered
    for _ in 0..3 {
        assert!(client.send("NOT_A_COMMAND").await);
    }
    tokio::time::sleep(Duration::from_secs(4)).await;

    // THEN: Still the first connection
    assert!(client.is_connected());
    assert_eq!(tv.attempts().len(), 1);

    client.close().await;
}

/// **VALUE**: Verifies a reply that does not decode is dropped without touching the link.
///
/// **WHY THIS MATTERS**: Line noise or a firmware quirk on one reply says nothing about
/// the socket; tearing it down would stall every queued command behind a reconnect.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Decode failures classified as transport failures
/// - Garbage being folded into the state
#[tokio::test(start_paused = true)]
async fn given_undecodable_reply_when_sending_then_state_and_connection_are_kept() {
    // GIVEN: A TV answering everything with bytes that are not a frame
    let connector = ScriptedConnector::new([], Outcome::Garbled);
    let tv = connector.clone();
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");
    assert!(eventually(Duration::from_secs(2), || client.is_connected()).await);

    // WHEN
    assert!(client.send("CURRENT_VOL").await);
    tokio::time::sleep(Duration::from_secs(2)).await;

    // THEN: Nothing applied, no reconnect
    assert_eq!(client.get_state().current_volume, 0);
    assert_eq!(tv.attempts().len(), 1);
    assert!(client.is_connected());

    client.close().await;
}

/// **VALUE**: Verifies the first connection is retried once a second until it succeeds.
///
/// **WHY THIS MATTERS**: Clients are usually built while the TV is still booting; the
/// first dial failing must not leave the client disconnected forever.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Giving up after the first refusal
/// - Retrying in a tight loop instead of on the one second tick
#[tokio::test(start_paused = true)]
async fn given_refused_first_dials_when_creating_client_then_connects_on_third_tick() {
    // GIVEN: Two refusals before the TV accepts
    let started = Instant::now();
    let connector = ScriptedConnector::new([Outcome::Fail, Outcome::Fail], Outcome::Responsive);
    let tv = connector.clone();

    // WHEN
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");

    // THEN: Connected at about two seconds, after three dials one tick apart
    assert!(eventually(Duration::from_secs(3), || client.is_connected()).await);
    let attempts = tv.attempts();
    assert_eq!(attempts.len(), 3, "Expected three dials, saw {attempts:?}");
    assert!(attempts[0] - started < Duration::from_millis(5), "First dial must be immediate");
    for pair in attempts.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(
            gap >= INITIAL_CONNECT_INTERVAL && gap <= INITIAL_CONNECT_INTERVAL + Duration::from_millis(5),
            "expected ~{INITIAL_CONNECT_INTERVAL:?} between dials, got {gap:?}"
        );
    }

    client.close().await;
}

/// **VALUE**: Verifies the state poll sends the whole query battery once per interval.
///
/// **WHY THIS MATTERS**: Nothing else refreshes the snapshot; callers reading
/// `get_state` without sending anything rely on the poll alone.
///
/// **BUG THIS CATCHES**: Would catch:
/// - The poll never starting
/// - Queries missing from the battery or sent out of order
#[tokio::test(start_paused = true)]
async fn given_connected_client_when_poll_interval_passes_then_state_queries_arrive() {
    // GIVEN: A connected client and no manual sends
    let started = Instant::now();
    let connector = ScriptedConnector::new([], Outcome::Responsive);
    let tv = connector.clone();
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");
    assert!(eventually(Duration::from_secs(2), || client.is_connected()).await);

    // WHEN: One poll interval passes
    assert!(
        eventually(POLL_INTERVAL + Duration::from_secs(1), || {
            tv.log.commands().len() >= STATE_QUERIES.len()
        })
        .await
    );

    // THEN: Exactly the battery, in order, right after the first tick
    let entries = tv.log.entries();
    let commands: Vec<String> = entries.iter().map(|(_, c)| c.clone()).collect();
    assert_eq!(commands, STATE_QUERIES.map(String::from).to_vec());
    for (at, command) in &entries {
        let offset = *at - started;
        assert!(
            offset >= POLL_INTERVAL && offset < POLL_INTERVAL + Duration::from_millis(500),
            "{command:?} arrived at {offset:?}"
        );
    }

    // THEN: The replies reached the snapshot
    assert!(eventually(Duration::from_secs(1), || client.get_state().current_volume == 37).await);

    client.close().await;
}

/// **VALUE**: Verifies the state poll skips its tick while disconnected.
///
/// **WHY THIS MATTERS**: Queries enqueued while the TV is off fail in the pipeline and
/// trigger extra dials on top of the connect loop.
///
/// **BUG THIS CATCHES**: Would catch the connection check being dropped from the poll.
#[tokio::test(start_paused = true)]
async fn given_disconnected_client_when_poll_interval_passes_then_nothing_is_enqueued() {
    // GIVEN: A TV that refuses for the first seven seconds, across the first poll tick
    let started = Instant::now();
    let connector = ScriptedConnector::new([Outcome::Fail; 7], Outcome::Responsive);
    let tv = connector.clone();
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");

    // WHEN: Waiting until just before the second tick
    tokio::time::sleep(POLL_INTERVAL * 2 - Duration::from_millis(500)).await;

    // THEN: Connected by now, with only the connect loop's dials and nothing sent
    assert!(client.is_connected());
    assert_eq!(tv.attempts().len(), 8, "Queries from the first tick caused extra dials");
    assert!(tv.log.commands().is_empty(), "Sent {:?}", tv.log.commands());

    // THEN: The battery follows on the next tick
    assert!(
        eventually(Duration::from_secs(1), || {
            tv.log.commands().len() >= STATE_QUERIES.len()
        })
        .await
    );
    let (first, _) = tv.log.entries()[0].clone();
    assert!(first - started >= POLL_INTERVAL * 2);

    client.close().await;
}
