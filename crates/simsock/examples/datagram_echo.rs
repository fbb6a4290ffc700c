//! Polled UDP ping/pong built on the datagram endpoint.
//!
//! Run the echo side first:
//! - cargo run -p simsock --example datagram_echo -- echo 127.0.0.1:9100
//!
//! Then the ping side:
//! - cargo run -p simsock --example datagram_echo -- ping 127.0.0.1:9100
//!
//! The echo side returns every datagram to its sender; the ping side sends
//! a counter datagram each second and prints the replies.

use std::{env, net::SocketAddrV4, thread, time::Duration};

use simsock::{DatagramEndpoint, SimAddress};

fn parse_args() -> Option<(String, SimAddress)> {
    let mut args = env::args().skip(1);
    let role = args.next()?;
    let addr: SocketAddrV4 = args
        .next()
        .unwrap_or_else(|| "127.0.0.1:9100".to_string())
        .parse()
        .ok()?;
    Some((role, SimAddress::from_socket_addr(addr)))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (role, addr) = match parse_args() {
        Some(parsed) => parsed,
        None => {
            eprintln!("usage: datagram_echo <echo|ping> [addr:port]");
            return;
        }
    };

    match role.as_str() {
        "echo" => echo_loop(addr),
        "ping" => ping_loop(addr),
        other => eprintln!("unknown role {:?}, expected echo or ping", other),
    }
}

fn echo_loop(addr: SimAddress) {
    let mut endpoint = DatagramEndpoint::bind(addr);
    println!("echoing datagrams on {}", addr);

    let mut buf = [0u8; 1024];
    loop {
        if endpoint.available_bytes() > 0 {
            let (count, sender) = endpoint.receive_from(&mut buf);
            if count > 0 {
                let chunk = &buf[..count as usize];
                println!("[echo] {} bytes from {}", count, sender);
                endpoint.send_to(sender, chunk);
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}

fn ping_loop(addr: SimAddress) {
    let mut endpoint = DatagramEndpoint::bind_any();
    let local = endpoint.local_addr().expect("bind_any should succeed");
    println!("pinging {} from {}", addr, local);

    let mut buf = [0u8; 1024];
    for i in 0.. {
        let msg = format!("ping {}", i);
        if endpoint.send_to(addr, msg.as_bytes()) < 0 {
            eprintln!("send failed, giving up");
            return;
        }

        // Poll for the reply for up to a second before the next tick.
        for _ in 0..100 {
            if endpoint.available_bytes() > 0 {
                let (count, sender) = endpoint.receive_from(&mut buf);
                if count > 0 {
                    println!(
                        "[reply] {:?} from {}",
                        String::from_utf8_lossy(&buf[..count as usize]),
                        sender
                    );
                }
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}
