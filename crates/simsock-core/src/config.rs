//! Configuration options for bridge endpoints.

use std::io;

use socket2::SockRef;

use crate::constants::DEFAULT_RECEIVE_BUFFER_SIZE;

/// Configuration options to tune endpoint and socket behavior.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the scratch buffer used for availability peeks. Also the
    /// upper bound on the byte count a single availability poll reports;
    /// remaining bytes show up on the next poll.
    pub receive_buffer_max_size: usize,
    /// Set SO_REUSEADDR on passive-open listeners so a restarted simulation
    /// can rebind its port immediately.
    pub reuse_address: bool,
    /// Socket receive buffer size in bytes (None = use system default).
    /// Corresponds to the SO_RCVBUF socket option.
    pub socket_recv_buffer_size: Option<usize>,
    /// Socket send buffer size in bytes (None = use system default).
    /// Corresponds to the SO_SNDBUF socket option.
    pub socket_send_buffer_size: Option<usize>,
    /// Time-to-live for outgoing packets (None = use system default).
    /// Corresponds to the IP_TTL socket option.
    pub socket_ttl: Option<u32>,
    /// Disable Nagle's algorithm on stream connections (TCP_NODELAY).
    pub socket_nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receive_buffer_max_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            reuse_address: true,
            socket_recv_buffer_size: None, // Use system default
            socket_send_buffer_size: None, // Use system default
            socket_ttl: None,              // Use system default
            socket_nodelay: false,
        }
    }
}

/// Applies socket options from configuration to any socket type that
/// socket2 can borrow (TCP listeners, TCP streams, UDP sockets).
pub fn apply_socket_options<'s, S>(socket: &'s S, config: &Config) -> io::Result<()>
where
    SockRef<'s>: From<&'s S>,
{
    let socket2 = SockRef::from(socket);

    if let Some(size) = config.socket_recv_buffer_size {
        socket2.set_recv_buffer_size(size)?;
    }

    if let Some(size) = config.socket_send_buffer_size {
        socket2.set_send_buffer_size(size)?;
    }

    if let Some(ttl) = config.socket_ttl {
        socket2.set_ttl(ttl)?;
    }

    Ok(())
}
