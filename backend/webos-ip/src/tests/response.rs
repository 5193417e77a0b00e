use crate::pipeline::response::{
    QUERY_CURRENT_APP, QUERY_CURRENT_VOLUME, QUERY_IP_CONTROL_STATE, QUERY_MAC_ADDRESS_WIFI,
    QUERY_MAC_ADDRESS_WIRED, QUERY_MUTE_STATE, STATE_QUERIES, apply_response, parse_on,
};
use crate::state::DeviceState;

/// **VALUE**: Verifies volume replies update the state and empty ones are ignored.
///
/// **WHY THIS MATTERS**: The TV answers `VOL:` while it is still booting; treating that
/// as zero would flash the volume to 0 in every UI.
///
/// **BUG THIS CATCHES**: Would catch parsing an empty string as 0 or failing the worker.
#[test]
fn given_volume_replies_when_applied_then_only_numbers_change_state() {
    // GIVEN: A state with a known volume
    let mut state = DeviceState::default();

    // WHEN: The TV reports 37
    let changed = apply_response(QUERY_CURRENT_VOLUME, "VOL:37", &mut state);

    // THEN: Volume is 37
    assert!(changed);
    assert_eq!(state.current_volume, 37);

    // WHEN/THEN: Empty and garbage replies leave it alone
    assert!(!apply_response(QUERY_CURRENT_VOLUME, "VOL:", &mut state));
    assert!(!apply_response(QUERY_CURRENT_VOLUME, "VOL:loud", &mut state));
    assert_eq!(state.current_volume, 37);
}

/// **VALUE**: Verifies mute parsing is case-insensitive for prefix and value.
///
/// **WHY THIS MATTERS**: Firmware versions disagree on letter case.
///
/// **BUG THIS CATCHES**: Would catch an exact-match `"on"` comparison or a
/// case-sensitive prefix strip.
#[test]
fn given_mute_replies_when_applied_then_on_in_any_case_is_true() {
    for (reply, expected) in [
        ("MUTE:on", true),
        ("MUTE:ON", true),
        ("mute:On", true),
        ("MUTE:off", false),
        ("MUTE:", false),
        ("MUTE:yes", false),
        ("", false),
    ] {
        // GIVEN: A state with the opposite value
        let mut state = DeviceState {
            mute_state: !expected,
            ..Default::default()
        };

        // WHEN
        apply_response(QUERY_MUTE_STATE, reply, &mut state);

        // THEN
        assert_eq!(state.mute_state, expected, "reply {reply:?}");
    }
}

/// **VALUE**: Verifies the address and app queries store their payloads.
///
/// **WHY THIS MATTERS**: Stored addresses are what `power_on` uses once the TV has
/// gone to standby.
///
/// **BUG THIS CATCHES**: Would catch swapping the wired and wifi fields.
#[test]
fn given_address_and_app_replies_when_applied_then_fields_are_stored() {
    // GIVEN
    let mut state = DeviceState::default();

    // WHEN
    apply_response(QUERY_MAC_ADDRESS_WIRED, "a8:23:fe:00:00:01", &mut state);
    apply_response(QUERY_MAC_ADDRESS_WIFI, "a8:23:fe:00:00:02", &mut state);
    apply_response(QUERY_CURRENT_APP, "APP:com.webos.app.hdmi2", &mut state);

    // THEN
    assert_eq!(state.mac_address_wired, "a8:23:fe:00:00:01");
    assert_eq!(state.mac_address_wifi, "a8:23:fe:00:00:02");
    assert_eq!(state.current_app, "com.webos.app.hdmi2");
}

/// **VALUE**: Verifies action replies and the control-state query never touch state.
///
/// **WHY THIS MATTERS**: Only query commands may write state; anything else would let
/// an `OK` overwrite a field.
///
/// **BUG THIS CATCHES**: Would catch a catch-all arm that stores the raw response.
#[test]
fn given_non_query_replies_when_applied_then_state_is_unchanged() {
    // GIVEN
    let mut state = DeviceState {
        current_volume: 12,
        current_app: String::from("netflix"),
        ..Default::default()
    };
    let before = state.clone();

    // WHEN
    let results = [
        apply_response(QUERY_IP_CONTROL_STATE, "off", &mut state),
        apply_response(QUERY_IP_CONTROL_STATE, "ON", &mut state),
        apply_response("POWER off", "OK", &mut state),
        apply_response("VOLUME_CONTROL 10", "ERROR", &mut state),
        apply_response("KEY_ACTION home", "", &mut state),
    ];

    // THEN
    assert!(results.iter().all(|changed| !changed));
    assert_eq!(state, before);
}

#[test]
fn given_state_queries_then_battery_has_six_distinct_commands() {
    let mut queries = STATE_QUERIES.to_vec();
    queries.sort_unstable();
    queries.dedup();
    assert_eq!(queries.len(), 6);
}

#[test]
fn given_bool_words_when_parsed_then_only_on_is_true() {
    assert!(parse_on("on"));
    assert!(parse_on("oN"));
    assert!(!parse_on("off"));
    assert!(!parse_on(" on"));
    assert!(!parse_on("1"));
}
