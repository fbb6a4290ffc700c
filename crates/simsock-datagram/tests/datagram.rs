//! Integration tests for the simsock-datagram crate.

use std::{net::SocketAddr, thread, time::Duration};

use simsock_core::addr::SimAddress;
use simsock_datagram::DatagramEndpoint;

fn loopback(port: i32) -> SimAddress {
    SimAddress::new([127, 0, 0, 1], port)
}

fn bound_addr(endpoint: &DatagramEndpoint) -> SimAddress {
    match endpoint.local_addr().expect("endpoint should be bound") {
        SocketAddr::V4(v4) => SimAddress::from_socket_addr(v4),
        other => panic!("expected an IPv4 address, got {}", other),
    }
}

fn poll_until(mut ready: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if ready() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn echo_roundtrip_reports_sender_port() {
    let mut a = DatagramEndpoint::bind(loopback(0));
    let mut b = DatagramEndpoint::bind(loopback(0));
    let addr_a = bound_addr(&a);
    let addr_b = bound_addr(&b);

    assert_eq!(a.send_to(addr_b, b"ping"), 4);
    assert!(poll_until(|| b.available_bytes() == 4));

    let mut buf = [0u8; 16];
    let (count, sender) = b.receive_from(&mut buf);
    assert_eq!(count, 4);
    assert_eq!(&buf[..4], b"ping");
    assert_eq!(sender.ip, [127, 0, 0, 1]);
    assert_eq!(sender.port, addr_a.port);

    // And back the other way.
    assert_eq!(b.send_to(sender, b"pong"), 4);
    assert!(poll_until(|| a.available_bytes() == 4));
    let (count, from) = a.receive_from(&mut buf);
    assert_eq!(count, 4);
    assert_eq!(&buf[..4], b"pong");
    assert_eq!(from.port, addr_b.port);
}

#[test]
fn available_bytes_reports_first_pending_datagram() {
    let mut a = DatagramEndpoint::bind(loopback(0));
    let mut b = DatagramEndpoint::bind(loopback(0));
    let addr_b = bound_addr(&b);

    assert_eq!(b.available_bytes(), 0);

    assert_eq!(a.send_to(addr_b, b"abc"), 3);
    assert_eq!(a.send_to(addr_b, b"defgh"), 5);

    // Datagram boundaries are preserved: the first one sets the count.
    assert!(poll_until(|| b.available_bytes() == 3));

    let mut buf = [0u8; 16];
    let (count, _) = b.receive_from(&mut buf);
    assert_eq!(count, 3);
    assert!(poll_until(|| b.available_bytes() == 5));
}

#[test]
fn failed_bind_yields_error_sentinels() {
    // TEST-NET-1, never assigned to a local interface
    let mut endpoint = DatagramEndpoint::bind(SimAddress::new([192, 0, 2, 1], 4));

    assert_eq!(endpoint.send_to(loopback(9), b"x"), -1);
    assert_eq!(endpoint.available_bytes(), 0);

    let mut buf = [0u8; 4];
    let (count, sender) = endpoint.receive_from(&mut buf);
    assert_eq!(count, -1);
    assert_eq!(sender, SimAddress::UNSPECIFIED);
}

#[test]
fn receive_without_data_reports_error_sentinel() {
    let mut endpoint = DatagramEndpoint::bind_any();
    let mut buf = [0u8; 8];
    let (count, sender) = endpoint.receive_from(&mut buf);
    assert_eq!(count, -1);
    assert_eq!(sender, SimAddress::UNSPECIFIED);
}
