use webos_ip::error::WakeError;
use webos_ip::wake::{MacAddress, MagicPacket, wake};

use std::time::Duration;

use tokio::net::UdpSocket;

/// **VALUE**: Verifies the packet actually leaves over UDP intact.
///
/// **WHY THIS MATTERS**: Building the right bytes is useless if the socket sends a
/// truncated datagram.
///
/// **BUG THIS CATCHES**: Would catch sending a slice of the buffer instead of the packet.
#[tokio::test]
async fn given_local_receiver_when_sending_magic_packet_then_payload_arrives_intact() {
    // GIVEN: A UDP receiver on loopback
    let receiver = UdpSocket::bind("127.0.0.1:0").await.expect("bind receiver");
    let target = receiver.local_addr().expect("receiver addr");
    let packet = MagicPacket::new("AA:BB:CC:DD:EE:FF".parse::<MacAddress>().expect("valid"));

    // WHEN: Sending with a zero timeout (meaning the default)
    packet.send_to(target, Duration::ZERO).await.expect("send succeeds");

    // THEN
    let mut buf = [0u8; 256];
    let (n, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
        .await
        .expect("datagram within 2 s")
        .expect("recv succeeds");
    assert_eq!(&buf[..n], packet.as_bytes());
}

/// **VALUE**: Verifies a malformed address fails before any socket is opened.
///
/// **WHY THIS MATTERS**: `power_on` aggregates these errors; they must say what was wrong.
///
/// **BUG THIS CATCHES**: Would catch bad octets producing a network error instead.
#[tokio::test]
async fn given_bad_address_when_waking_then_returns_parse_error() {
    let result = wake("AA:BB:CC:DD:EE:ZZ", Duration::from_secs(1)).await;

    match result {
        Err(WakeError::Parse { message, .. }) => assert!(message.contains("ZZ")),
        other => panic!("Expected Parse error, got {other:?}"),
    }
}
