//! Polled TCP echo peer built on the stream endpoint.
//!
//! Run the passive side first:
//! - cargo run -p simsock --example stream_echo -- listen 127.0.0.1:9000
//!
//! Then the active side:
//! - cargo run -p simsock --example stream_echo -- connect 127.0.0.1:9000
//!
//! The passive side echoes every chunk it receives; the active side sends a
//! counter message each second. Both drive the endpoint from a plain tick
//! loop, the way a clocked simulation model would.

use std::{env, net::SocketAddrV4, thread, time::Duration};

use simsock::{SimAddress, StreamEndpoint};

fn parse_args() -> Option<(String, SimAddress)> {
    let mut args = env::args().skip(1);
    let role = args.next()?;
    let addr: SocketAddrV4 = args
        .next()
        .unwrap_or_else(|| "127.0.0.1:9000".to_string())
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
            eprintln!("usage: stream_echo <listen|connect> [addr:port]");
            return;
        }
    };

    match role.as_str() {
        "listen" => listen_loop(addr),
        "connect" => connect_loop(addr),
        other => eprintln!("unknown role {:?}, expected listen or connect", other),
    }
}

fn listen_loop(addr: SimAddress) {
    let mut endpoint = StreamEndpoint::listen(addr);
    println!("waiting for a peer on {}", addr);

    let mut was_connected = false;
    let mut buf = [0u8; 1024];
    loop {
        if endpoint.is_connected() != was_connected {
            was_connected = !was_connected;
            println!(
                "[{}]",
                if was_connected { "connect" } else { "disconnect" }
            );
            if !was_connected {
                // Single-peer listener: once the peer leaves, we are done.
                return;
            }
        }

        let pending = endpoint.available_bytes();
        if pending > 0 {
            let count = endpoint.receive(&mut buf);
            if count > 0 {
                let chunk = &buf[..count as usize];
                println!("[echo] {:?}", String::from_utf8_lossy(chunk));
                endpoint.send(chunk);
            }
        }

        thread::sleep(Duration::from_millis(10));
    }
}

fn connect_loop(addr: SimAddress) {
    let mut endpoint = StreamEndpoint::connect(addr);
    if !endpoint.is_connected() {
        eprintln!("could not reach {}", addr);
        return;
    }

    let mut buf = [0u8; 1024];
    for i in 0.. {
        if !endpoint.is_connected() {
            println!("[disconnect]");
            return;
        }

        let msg = format!("tick {}", i);
        endpoint.send(msg.as_bytes());

        // Poll for the echo for up to a second before the next tick.
        for _ in 0..100 {
            let count = endpoint.receive(&mut buf);
            if count > 0 {
                println!("[reply] {:?}", String::from_utf8_lossy(&buf[..count as usize]));
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}
