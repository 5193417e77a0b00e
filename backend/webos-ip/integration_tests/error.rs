use webos_ip::error::{ClientError, CodecError, ConnectionError, CoreError, WakeError};

use common::ErrorLocation;

use std::error::Error;
use std::io::{Error as IoError, ErrorKind};
use std::panic::Location;

/// **VALUE**: Verifies errors carry their kind, message and source location.
///
/// **WHY THIS MATTERS**: Connection failures surface in logs hours after the fact; the
/// file and line are what make them actionable.
///
/// **BUG THIS CATCHES**: Would catch a Display format that drops the location.
#[test]
#[track_caller]
fn given_connection_error_when_formatted_then_includes_kind_message_and_location() {
    // GIVEN
    let err = ConnectionError::Dial {
        message: "cannot connect to tv:9761".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: IoError::new(ErrorKind::ConnectionRefused, "refused"),
    };

    // WHEN
    let text = err.to_string();

    // THEN
    assert!(text.starts_with("Dial Error: cannot connect to tv:9761"));
    assert!(text.contains("error.rs"));
    assert_eq!(
        err.source().map(|s| s.to_string()),
        Some("refused".to_string())
    );
}

/// **VALUE**: Verifies only decode errors keep the connection.
///
/// **WHY THIS MATTERS**: This flag decides between carrying on and entering the
/// reconnect loop.
///
/// **BUG THIS CATCHES**: Would catch write timeouts being treated as harmless.
#[test]
#[track_caller]
fn given_connection_errors_when_classified_then_only_decode_is_not_transport() {
    let location = ErrorLocation::from(Location::caller());

    let decode = ConnectionError::Decode {
        message: "bad reply".to_string(),
        location,
        source: CodecError::Frame {
            message: "short".to_string(),
            location,
        },
    };
    let write_timeout = ConnectionError::WriteTimeout {
        message: "slow".to_string(),
        location,
    };
    let not_connected = ConnectionError::NotConnected {
        message: "none".to_string(),
        location,
    };

    assert!(!decode.is_transport());
    assert!(write_timeout.is_transport());
    assert!(not_connected.is_transport());
}

/// **VALUE**: Verifies the aggregate error forwards Display unchanged.
///
/// **WHY THIS MATTERS**: Front-ends log `CoreError`; wrapping must not hide the cause.
///
/// **BUG THIS CATCHES**: Would catch a non-transparent wrapper adding noise.
#[test]
#[track_caller]
fn given_area_errors_when_wrapped_in_core_error_then_display_is_transparent() {
    let location = ErrorLocation::from(Location::caller());

    let wake = WakeError::Timeout {
        message: "magic packet not sent".to_string(),
        location,
    };
    let expected = wake.to_string();
    assert_eq!(CoreError::from(wake).to_string(), expected);

    let client = ClientError::NoHardwareAddress {
        message: "none known".to_string(),
        location,
    };
    let expected = client.to_string();
    let core = CoreError::from(client);
    assert_eq!(core.to_string(), expected);
    assert!(expected.starts_with("No Hardware Address Error: none known"));
}
