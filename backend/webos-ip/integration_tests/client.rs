use crate::helpers::{FakeTv, Outcome, ScriptedConnector, WIFI_MAC, WIRED_MAC, config, eventually};

use webos_ip::client::CHANGE_INPUT_TIMEOUT;
use webos_ip::error::ClientError;
use webos_ip::{Client, DeviceState};
use webos_ip::pipeline::STATE_QUERIES;

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

async fn connected_client(tv: &FakeTv) -> Client {
    let client = Client::new(config(&tv.address)).expect("valid config");
    assert!(
        eventually(Duration::from_secs(3), || client.is_connected()).await,
        "Client should connect to the fake TV"
    );
    client
}

/// **VALUE**: Verifies the full path: queue, rate limiter, codec, TCP, reply parsing, state.
///
/// **WHY THIS MATTERS**: Each piece can be correct on its own while the composition
/// is broken (wrong stream, wrong terminator, state never published).
///
/// **BUG THIS CATCHES**: Would catch replies not reaching the state snapshot.
#[tokio::test]
async fn given_fake_tv_when_queries_are_sent_then_state_is_refreshed() {
    // GIVEN: A connected client
    let tv = FakeTv::start().await;
    let client = connected_client(&tv).await;

    // WHEN: Sending the state query battery
    for query in STATE_QUERIES {
        assert!(client.send(query).await, "Queue should accept {query}");
    }

    // THEN: The state reflects the TV's replies
    assert!(
        eventually(Duration::from_secs(5), || {
            let state = client.get_state();
            state.current_volume == 37 && !state.current_app.is_empty()
        })
        .await
    );
    let state = client.get_state();
    assert_eq!(state.mac_address_wired, WIRED_MAC);
    assert_eq!(state.mac_address_wifi, WIFI_MAC);
    assert!(state.mute_state);
    assert_eq!(state.current_app, "com.webos.app.livetv");

    client.close().await;
}

/// **VALUE**: Verifies input changes send the right command and wait for confirmation.
///
/// **WHY THIS MATTERS**: The TV never acknowledges input switches; the only signal is
/// the foreground app changing.
///
/// **BUG THIS CATCHES**: Would catch returning before the app changed, or app inputs
/// being sent as `INPUT_SELECT`.
#[tokio::test]
async fn given_known_inputs_when_changing_input_then_tv_receives_command() {
    // GIVEN: A connected client and a refresher standing in for the 5 s poll
    let tv = FakeTv::start().await;
    let client = connected_client(&tv).await;
    let stop = CancellationToken::new();

    let refresh = async {
        while !stop.is_cancelled() {
            client.send("CURRENT_APP").await;
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    };
    let switch = async {
        let hdmi = client.change_input("hdmi2").await;
        let youtube = client.change_input("youtube").await;
        stop.cancel();
        (hdmi, youtube)
    };

    // WHEN
    let (_, (hdmi, youtube)) = tokio::join!(refresh, switch);

    // THEN
    assert!(hdmi.is_ok(), "hdmi2 switch failed: {hdmi:?}");
    assert!(youtube.is_ok(), "youtube switch failed: {youtube:?}");
    assert!(tv.log.contains("INPUT_SELECT hdmi2"));
    assert!(tv.log.contains("APP_LAUNCH youtube.leanback.v4"));
    assert_eq!(client.get_state().current_app, "youtube.leanback.v4");

    client.close().await;
}

/// **VALUE**: Verifies unknown inputs fail fast without any traffic.
///
/// **WHY THIS MATTERS**: A typo should not cost ten seconds of polling.
///
/// **BUG THIS CATCHES**: Would catch validation happening after the enqueue.
#[tokio::test]
async fn given_unknown_input_when_changing_input_then_fails_and_sends_nothing() {
    // GIVEN
    let tv = FakeTv::start().await;
    let client = connected_client(&tv).await;

    // WHEN
    let result = client.change_input("bogus").await;

    // THEN
    assert!(matches!(result, Err(ClientError::InvalidInput { .. })));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(tv.log.commands().iter().all(|c| !c.contains("bogus")));

    client.close().await;
}

/// **VALUE**: Verifies power off and button presses reach the TV verbatim.
///
/// **WHY THIS MATTERS**: These are the commands users notice when they fail.
///
/// **BUG THIS CATCHES**: Would catch a typo in the fixed command strings.
#[tokio::test]
async fn given_connected_client_when_powering_off_and_pressing_button_then_commands_arrive() {
    // GIVEN
    let tv = FakeTv::start().await;
    let client = connected_client(&tv).await;

    // WHEN
    client.power_off().await.expect("power off enqueued");
    client.press_button("home").await.expect("button enqueued");

    // THEN
    assert!(
        eventually(Duration::from_secs(3), || {
            tv.log.contains("POWER off") && tv.log.contains("KEY_ACTION home")
        })
        .await
    );
    assert!(matches!(
        client.press_button("  ").await,
        Err(ClientError::InvalidInput { .. })
    ));

    client.close().await;
}

/// **VALUE**: Verifies power on refuses to run without any hardware address.
///
/// **WHY THIS MATTERS**: A freshly configured client talking to a TV that is already
/// off has never learned its address; the caller must be told to configure one.
///
/// **BUG THIS CATCHES**: Would catch a silent Ok when there was nothing to wake.
#[tokio::test]
async fn given_no_known_address_when_powering_on_then_returns_descriptive_error() {
    // GIVEN: A client whose TV is unreachable
    let connector = ScriptedConnector::new([], Outcome::Fail);
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");

    // WHEN
    let result = client.power_on().await;

    // THEN
    match result {
        Err(ClientError::NoHardwareAddress { message, .. }) => {
            assert!(message.contains("hardware address"));
        }
        other => panic!("Expected NoHardwareAddress, got {other:?}"),
    }

    client.close().await;
}

/// **VALUE**: Verifies `change_input` gives up after ten seconds when the app never changes.
///
/// **WHY THIS MATTERS**: A TV that ignores the switch must not hang the caller.
///
/// **BUG THIS CATCHES**: Would catch the deadline being dropped from the resend loop.
#[tokio::test(start_paused = true)]
async fn given_tv_that_never_switches_when_changing_input_then_times_out() {
    // GIVEN: A connected TV that never answers
    let connector = ScriptedConnector::new([], Outcome::Silent);
    let client = Client::with_connector(config("scripted-tv:9761"), connector).expect("valid config");
    assert!(eventually(Duration::from_secs(2), || client.is_connected()).await);

    // WHEN
    let started = Instant::now();
    let result = client.change_input("hdmi1").await;
    let elapsed = started.elapsed();

    // THEN
    match result {
        Err(ClientError::Timeout { message, .. }) => assert!(message.contains("hdmi1")),
        other => panic!("Expected Timeout error, got {other:?}"),
    }
    assert!(
        elapsed >= CHANGE_INPUT_TIMEOUT && elapsed < CHANGE_INPUT_TIMEOUT + Duration::from_millis(100),
        "gave up after {elapsed:?}"
    );

    client.close().await;
}

/// **VALUE**: Verifies the client can be built while the TV is down.
///
/// **WHY THIS MATTERS**: Services start before the TV is switched on.
///
/// **BUG THIS CATCHES**: Would catch construction dialing synchronously.
#[tokio::test]
async fn given_unreachable_tv_when_creating_client_then_construction_succeeds() {
    // GIVEN: A port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("addr").to_string();
    drop(listener);

    // WHEN
    let client = Client::new(config(&address));

    // THEN
    let client = client.expect("construction must not require the TV");
    assert!(!client.is_connected());
    assert_eq!(client.get_state(), DeviceState::default());
    client.close().await;
}

/// **VALUE**: Verifies close cancels pending work and is safe to repeat.
///
/// **WHY THIS MATTERS**: Front-ends call close from shutdown hooks that may run twice.
///
/// **BUG THIS CATCHES**: Would catch `must_send` hanging after close.
#[tokio::test]
async fn given_closed_client_when_sending_then_commands_are_rejected() {
    // GIVEN
    let tv = FakeTv::start().await;
    let client = connected_client(&tv).await;

    // WHEN
    client.close().await;
    client.close().await;

    // THEN
    assert!(!client.is_connected());
    assert!(!client.send("MUTE_STATE").await);
    let result = client.must_send(&CancellationToken::new(), "POWER off").await;
    assert!(matches!(result, Err(ClientError::Cancelled { .. })));
}

/// **VALUE**: Verifies construction errors are returned synchronously.
///
/// **WHY THIS MATTERS**: An empty pairing key can never produce a working session.
///
/// **BUG THIS CATCHES**: Would catch a client starting background tasks with a bad key.
#[tokio::test]
async fn given_empty_pairing_key_when_creating_client_then_returns_config_error() {
    let config = webos_ip::ClientConfig::new("127.0.0.1:9761", webos_ip::RedactedKey::new(""));
    let result = Client::new(config);
    assert!(matches!(result, Err(ClientError::Config(_))));
}

#[test]
fn given_no_runtime_when_creating_client_then_returns_runtime_error() {
    let result = Client::new(config("127.0.0.1:9761"));
    assert!(matches!(result, Err(ClientError::Runtime { .. })));
}
