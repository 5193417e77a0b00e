use crate::error::wake::WakeError;
use crate::wake::{MAGIC_PACKET_LEN, MacAddress, MagicPacket, WOL_BROADCAST_ADDRESS};

/// **VALUE**: Verifies the exact magic packet layout.
///
/// **WHY THIS MATTERS**: Network cards match the payload byte for byte; one wrong byte
/// and the TV stays off with no error anywhere.
///
/// **BUG THIS CATCHES**: Would catch a short sync header, a wrong repetition count,
/// or octets written in reverse order.
#[test]
fn given_hardware_address_when_building_packet_then_layout_is_sync_plus_sixteen_copies() {
    // GIVEN: A parsed address
    let address: MacAddress = "AA:BB:CC:DD:EE:FF".parse().expect("valid address");

    // WHEN: Building the packet
    let packet = MagicPacket::new(address);
    let bytes = packet.as_bytes();

    // THEN: 102 bytes, six 0xFF then sixteen copies of the address
    assert_eq!(bytes.len(), 102);
    assert_eq!(MAGIC_PACKET_LEN, 102);
    assert_eq!(&bytes[..6], &[0xff; 6]);
    for copy in bytes[6..].chunks(6) {
        assert_eq!(copy, &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }
}

/// **VALUE**: Verifies octets must be one or two bare hex digits.
///
/// **WHY THIS MATTERS**: Integer parsing accepts a leading sign, so `+a` would slip
/// through as 0x0a and wake the wrong machine instead of reporting a typo.
///
/// **BUG THIS CATCHES**: Would catch relying on `u8::from_str_radix` alone.
#[test]
fn given_signed_or_empty_octets_when_parsed_then_returns_parse_error() {
    // GIVEN: Octets that integer parsing alone would accept or mishandle
    for bad in ["+a:bb:cc:dd:ee:ff", "aa:bb:cc:dd:ee:+f", ":bb:cc:dd:ee:ff", "aa:bb:cc:dd:ee:0ff"] {
        // WHEN
        let result = bad.parse::<MacAddress>();

        // THEN
        assert!(
            matches!(result, Err(WakeError::Parse { .. })),
            "Should reject {bad:?}"
        );
    }

    // Single-digit octets stay valid
    let short: MacAddress = "a:b:c:d:e:f".parse().expect("single digits are valid");
    assert_eq!(short.octets(), [0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f]);
}

/// **VALUE**: Verifies parsing accepts either letter case and prints lowercase.
///
/// **WHY THIS MATTERS**: The TV reports addresses in lowercase while users type
/// uppercase from stickers.
///
/// **BUG THIS CATCHES**: Would catch case-sensitive hex parsing.
#[test]
fn given_mixed_case_address_when_parsed_then_displays_lowercase() {
    // GIVEN/WHEN
    let address: MacAddress = "aa:Bb:0c:DD:ee:01".parse().expect("valid address");

    // THEN
    assert_eq!(address.octets(), [0xaa, 0xbb, 0x0c, 0xdd, 0xee, 0x01]);
    assert_eq!(address.to_string(), "aa:bb:0c:dd:ee:01");
}

/// **VALUE**: Verifies malformed addresses produce parse errors.
///
/// **WHY THIS MATTERS**: A bad override in the config must be reported, not turned
/// into a packet for some other machine.
///
/// **BUG THIS CATCHES**: Would catch silently defaulting bad octets to zero.
#[test]
fn given_invalid_addresses_when_parsed_then_returns_parse_error() {
    // GIVEN: Addresses that are wrong in different ways
    for bad in [
        "",
        "AA:BB:CC:DD:EE",
        "AA:BB:CC:DD:EE:FF:00",
        "AA:BB:CC:DD:EE:GG",
        "AA-BB-CC-DD-EE-FF",
        "AAA:BB:CC:DD:EE:F",
    ] {
        // WHEN
        let result = bad.parse::<MacAddress>();

        // THEN
        assert!(
            matches!(result, Err(WakeError::Parse { .. })),
            "Should reject {bad:?}"
        );
    }
}

#[test]
fn given_broadcast_constant_when_parsed_then_targets_port_nine() {
    let target: std::net::SocketAddr = WOL_BROADCAST_ADDRESS.parse().expect("valid socket address");
    assert_eq!(target.port(), 9);
    assert_eq!(target.ip().to_string(), "255.255.255.255");
}
