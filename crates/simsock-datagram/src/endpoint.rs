//! The datagram endpoint: bind, send-to, polled receive-from.

use std::{
    fmt,
    io,
    net::{SocketAddr, UdpSocket},
    sync::Arc,
    time::{Duration, Instant},
};

use simsock_core::{
    addr::SimAddress,
    config::{apply_socket_options, Config},
    error::{ErrorKind, Result},
    time::{Clock, SystemClock},
};
use tracing::{debug, error, warn};

/// A single bound UDP socket driven entirely by caller polling.
///
/// A failed bind still yields an endpoint; it just has no socket, and every
/// operation on it reports its own error contract (a negative count for
/// send/receive, 0 for availability). Nothing here ever blocks: the socket
/// is non-blocking from the moment it is bound.
pub struct DatagramEndpoint {
    socket: Option<UdpSocket>,
    peek_buf: Vec<u8>,
    clock: Arc<dyn Clock>,
    origin: Instant,
}

impl fmt::Debug for DatagramEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatagramEndpoint")
            .field("socket", &self.socket)
            .finish()
    }
}

impl DatagramEndpoint {
    /// Binds `local` with default configuration.
    pub fn bind(local: SimAddress) -> Self {
        Self::bind_with_config(local, Config::default())
    }

    /// Binds any available port on localhost with default configuration.
    pub fn bind_any() -> Self {
        Self::bind(SimAddress::new([127, 0, 0, 1], 0))
    }

    /// Binds `local` with the specified configuration.
    pub fn bind_with_config(local: SimAddress, config: Config) -> Self {
        Self::bind_with_config_and_clock(local, config, Arc::new(SystemClock))
    }

    /// Binds `local` with custom configuration and clock.
    pub fn bind_with_config_and_clock(
        local: SimAddress,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let addr = SocketAddr::V4(local.to_socket_addr());
        let origin = clock.now();
        let socket = match open_socket(addr, &config) {
            Ok(socket) => {
                debug!("datagram socket bound to {}", addr);
                Some(socket)
            }
            Err(err) => {
                error!("bind of {} failed: {}", addr, err);
                None
            }
        };
        DatagramEndpoint {
            socket,
            peek_buf: vec![0; config.receive_buffer_max_size],
            clock,
            origin,
        }
    }

    /// Sends one datagram to `remote` with a single non-blocking call.
    ///
    /// Returns the OS-reported byte count, or -1 on any failure (including
    /// an endpoint whose bind failed).
    pub fn send_to(&mut self, remote: SimAddress, data: &[u8]) -> i32 {
        let socket = match self.socket.as_ref() {
            Some(socket) => socket,
            None => {
                warn!("send of {} bytes on an unbound endpoint", data.len());
                return -1;
            }
        };
        let addr = remote.to_socket_addr();
        match socket.send_to(data, addr) {
            Ok(sent) => sent as i32,
            Err(err) => {
                error!("send of {} bytes to {} failed: {}", data.len(), addr, err);
                -1
            }
        }
    }

    /// Returns the size of the next pending datagram without consuming it.
    ///
    /// 0 means no datagram has arrived yet (or the endpoint has no socket);
    /// -1 means the readiness query itself failed. The size is capped at
    /// the configured scratch capacity.
    pub fn available_bytes(&mut self) -> i32 {
        let peeked = match self.socket.as_ref() {
            Some(socket) => socket.peek(&mut self.peek_buf),
            None => return 0,
        };
        match peeked {
            Ok(count) => count as i32,
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => 0,
            Err(err) => {
                error!("availability check failed: {}", err);
                -1
            }
        }
    }

    /// Receives one datagram into `buffer` with a single non-blocking call.
    ///
    /// Returns the byte count and the decoded sender address. The sender
    /// slot is always written; on a negative count it is
    /// [`SimAddress::UNSPECIFIED`] and carries no meaning — check the count
    /// first.
    pub fn receive_from(&mut self, buffer: &mut [u8]) -> (i32, SimAddress) {
        let received = match self.socket.as_ref() {
            Some(socket) => socket.recv_from(buffer),
            None => return (-1, SimAddress::UNSPECIFIED),
        };
        match received {
            Ok((count, peer)) => {
                debug!("received {} bytes from {} at +{:?}", count, peer, self.uptime());
                let sender = match peer {
                    SocketAddr::V4(v4) => SimAddress::from_socket_addr(v4),
                    SocketAddr::V6(_) => SimAddress::UNSPECIFIED,
                };
                (count as i32, sender)
            }
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {
                (-1, SimAddress::UNSPECIFIED)
            }
            Err(err) => {
                error!("receive failed: {}", err);
                (-1, SimAddress::UNSPECIFIED)
            }
        }
    }

    /// Returns the locally bound address, if the bind succeeded. Lets a
    /// caller that bound port 0 discover the ephemeral port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|socket| socket.local_addr().ok())
    }

    fn uptime(&self) -> Duration {
        self.clock.now().duration_since(self.origin)
    }
}

fn open_socket(addr: SocketAddr, config: &Config) -> Result<UdpSocket> {
    let socket = UdpSocket::bind(addr).map_err(|source| ErrorKind::Bind { addr, source })?;
    socket.set_nonblocking(true)?;
    apply_socket_options(&socket, config)?;
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_any_yields_a_live_socket() {
        let endpoint = DatagramEndpoint::bind_any();
        let addr = endpoint.local_addr().expect("socket should be bound");
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn failed_bind_yields_an_endpoint_without_a_socket() {
        // TEST-NET-1, never assigned to a local interface
        let endpoint = DatagramEndpoint::bind(SimAddress::new([192, 0, 2, 1], 4));
        assert_eq!(endpoint.local_addr(), None);
    }
}
