//! The stream endpoint: passive/active open, polled send/receive.

use std::{
    fmt,
    io::{self, Read, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::Arc,
    time::{Duration, Instant},
};

use simsock_core::{
    addr::SimAddress,
    config::{apply_socket_options, Config},
    constants::LISTEN_BACKLOG,
    error::{ErrorKind, Result},
    time::{Clock, SystemClock},
};
use socket2::{Domain, Protocol, Socket as Socket2, Type};
use tracing::{debug, error, warn};

use crate::state::LinkState;

/// A single TCP connection endpoint driven entirely by caller polling.
///
/// An endpoint owns at most one listening socket (passive open) and at most
/// one established connection. No operation ever blocks: connection
/// establishment, availability and data transfer are all answered
/// immediately, possibly with "nothing yet". Failed setup leaves the
/// endpoint inert rather than failing the call — the caller's only error
/// channel is the status it polls.
///
/// The listening socket is never closed by any operation; it is released
/// when the endpoint is dropped. The connected socket is closed on peer
/// EOF, on a fatal socket error, or on drop.
pub struct StreamEndpoint {
    state: LinkState,
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
    peek_buf: Vec<u8>,
    config: Config,
    clock: Arc<dyn Clock>,
    origin: Instant,
}

impl fmt::Debug for StreamEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEndpoint")
            .field("state", &self.state)
            .field("listener", &self.listener)
            .field("stream", &self.stream)
            .finish()
    }
}

impl StreamEndpoint {
    /// Passive open: binds `local` and listens for the single expected peer
    /// with default configuration.
    pub fn listen(local: SimAddress) -> Self {
        Self::listen_with_config(local, Config::default())
    }

    /// Passive open with the specified configuration.
    pub fn listen_with_config(local: SimAddress, config: Config) -> Self {
        Self::listen_with_config_and_clock(local, config, Arc::new(SystemClock))
    }

    /// Passive open with custom configuration and clock.
    pub fn listen_with_config_and_clock(
        local: SimAddress,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let addr = SocketAddr::V4(local.to_socket_addr());
        let mut endpoint = Self::inert(config, clock);
        match open_listener(addr, &endpoint.config) {
            Ok(listener) => {
                debug!("listening on {}", addr);
                endpoint.listener = Some(listener);
                endpoint.state = LinkState::Listening;
            }
            Err(err) => error!("passive open of {} failed: {}", addr, err),
        }
        endpoint
    }

    /// Active open: dials `remote` with default configuration. The connect
    /// itself is the one blocking step; all subsequent I/O is non-blocking.
    pub fn connect(remote: SimAddress) -> Self {
        Self::connect_with_config(remote, Config::default())
    }

    /// Active open with the specified configuration.
    pub fn connect_with_config(remote: SimAddress, config: Config) -> Self {
        Self::connect_with_config_and_clock(remote, config, Arc::new(SystemClock))
    }

    /// Active open with custom configuration and clock.
    pub fn connect_with_config_and_clock(
        remote: SimAddress,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let addr = SocketAddr::V4(remote.to_socket_addr());
        let mut endpoint = Self::inert(config, clock);
        match open_connection(addr, &endpoint.config) {
            Ok(stream) => {
                debug!("connected to {}", addr);
                endpoint.stream = Some(stream);
                endpoint.state = LinkState::Connected;
            }
            Err(err) => error!("active open of {} failed: {}", addr, err),
        }
        endpoint
    }

    fn inert(config: Config, clock: Arc<dyn Clock>) -> Self {
        let origin = clock.now();
        StreamEndpoint {
            state: LinkState::Idle,
            listener: None,
            stream: None,
            peek_buf: vec![0; config.receive_buffer_max_size],
            config,
            clock,
            origin,
        }
    }

    /// Reports whether a peer is currently connected, completing a pending
    /// accept first.
    pub fn is_connected(&mut self) -> bool {
        self.try_complete_accept();
        self.state.is_connected()
    }

    /// Sends the whole buffer with a single non-blocking write.
    ///
    /// Unconnected endpoints drop the payload. A short write is not retried
    /// and the remainder is dropped; the caller's own tick-driven retry
    /// re-issues it if it cares. A zero-byte write result is the peer
    /// shutting down mid-send and tears the connection down.
    pub fn send(&mut self, data: &[u8]) {
        self.try_complete_accept();
        if data.is_empty() {
            return;
        }
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => {
                warn!("send of {} bytes on an unconnected endpoint, dropping", data.len());
                return;
            }
        };
        match stream.write(data) {
            Ok(0) => {
                debug!("write returned 0, peer is gone");
                self.close_connection();
            }
            Ok(written) if written < data.len() => {
                warn!("short write: {} of {} bytes, remainder dropped", written, data.len());
            }
            Ok(written) => debug!("sent {} bytes", written),
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {
                warn!("send of {} bytes would block, dropping", data.len());
            }
            Err(err) => {
                error!("send failed: {}", err);
                self.close_connection();
            }
        }
    }

    /// Returns how many bytes can currently be read without blocking.
    ///
    /// 0 covers "no data yet", "no connection", and "the connection just
    /// ended"; the caller separates those through `is_connected`. The count
    /// is capped at the configured scratch capacity; a later poll reports
    /// the rest. Detecting EOF or a fatal error here tears the connection
    /// down, same as a receive would.
    pub fn available_bytes(&mut self) -> i32 {
        self.try_complete_accept();
        let peeked = match self.stream.as_ref() {
            Some(stream) => stream.peek(&mut self.peek_buf),
            None => return 0,
        };
        match peeked {
            Ok(0) => {
                debug!("peek returned 0, peer closed at +{:?}", self.uptime());
                self.close_connection();
                0
            }
            Ok(count) => count as i32,
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => 0,
            Err(err) => {
                error!("availability check failed: {}", err);
                self.close_connection();
                0
            }
        }
    }

    /// Reads at most `buffer.len()` bytes with a single non-blocking read
    /// and returns the count.
    ///
    /// 0 means no connection, nothing ready yet, or a peer that closed
    /// gracefully (the connection is torn down in that case).
    pub fn receive(&mut self, buffer: &mut [u8]) -> i32 {
        self.try_complete_accept();
        if buffer.is_empty() {
            return 0;
        }
        let read = match self.stream.as_mut() {
            Some(stream) => stream.read(buffer),
            None => return 0,
        };
        match read {
            Ok(0) => {
                debug!("connection closed by peer at +{:?}", self.uptime());
                self.close_connection();
                0
            }
            Ok(count) => {
                debug!("received {} bytes", count);
                count as i32
            }
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => 0,
            Err(err) => {
                error!("receive failed: {}", err);
                self.close_connection();
                0
            }
        }
    }

    /// Returns the locally bound address (listening or connected), if any.
    /// Lets a caller that bound port 0 discover the ephemeral port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        if let Some(listener) = &self.listener {
            return listener.local_addr().ok();
        }
        self.stream.as_ref().and_then(|stream| stream.local_addr().ok())
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Completes a pending accept if a peer is waiting.
    ///
    /// Invoked as the first step of every public operation, so connection
    /// establishment needs no dedicated call. Only a `Listening` endpoint
    /// accepts, and only once.
    fn try_complete_accept(&mut self) {
        if !self.state.can_accept() {
            return;
        }
        let listener = match self.listener.as_ref() {
            Some(listener) => listener,
            None => return,
        };
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(err) = stream.set_nonblocking(true) {
                    error!("could not switch accepted connection to non-blocking: {}", err);
                }
                if let Err(err) = apply_socket_options(&stream, &self.config) {
                    warn!("could not apply socket options to accepted connection: {}", err);
                }
                if self.config.socket_nodelay {
                    if let Err(err) = stream.set_nodelay(true) {
                        warn!("could not disable Nagle on accepted connection: {}", err);
                    }
                }
                debug!("accepted connection from {} at +{:?}", peer, self.uptime());
                self.stream = Some(stream);
                self.state = LinkState::Connected;
            }
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {}
            Err(err) => error!("accept failed: {}", err),
        }
    }

    fn close_connection(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!("closing connection at +{:?}", self.uptime());
            drop(stream);
        }
        self.state = LinkState::Closed;
    }

    fn uptime(&self) -> Duration {
        self.clock.now().duration_since(self.origin)
    }
}

fn open_listener(addr: SocketAddr, config: &Config) -> Result<TcpListener> {
    let socket = Socket2::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(ErrorKind::SocketCreation)?;
    if config.reuse_address {
        socket.set_reuse_address(true).map_err(ErrorKind::SocketCreation)?;
    }
    apply_socket_options(&socket, config).map_err(ErrorKind::SocketCreation)?;
    socket
        .bind(&addr.into())
        .map_err(|source| ErrorKind::Bind { addr, source })?;
    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|source| ErrorKind::Listen { addr, source })?;

    let listener: TcpListener = socket.into();
    // The non-blocking listener replaces a zero-timeout readiness check:
    // accept either completes immediately or reports WouldBlock.
    listener.set_nonblocking(true)?;
    Ok(listener)
}

fn open_connection(addr: SocketAddr, config: &Config) -> Result<TcpStream> {
    let stream =
        TcpStream::connect(addr).map_err(|source| ErrorKind::Connect { addr, source })?;
    stream.set_nonblocking(true)?;
    apply_socket_options(&stream, config)?;
    if config.socket_nodelay {
        stream.set_nodelay(true)?;
    }
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unroutable() -> SimAddress {
        // TEST-NET-1, never assigned to a local interface
        SimAddress::new([192, 0, 2, 1], 4)
    }

    #[test]
    fn failed_passive_open_leaves_an_inert_endpoint() {
        let mut endpoint = StreamEndpoint::listen(unroutable());
        assert_eq!(endpoint.state(), LinkState::Idle);
        assert!(!endpoint.is_connected());
        assert_eq!(endpoint.available_bytes(), 0);

        let mut buf = [0u8; 8];
        assert_eq!(endpoint.receive(&mut buf), 0);

        // must not panic, only log
        endpoint.send(b"nobody is listening");
        assert_eq!(endpoint.local_addr(), None);
    }

    #[test]
    fn failed_active_open_leaves_an_inert_endpoint() {
        // Grab an ephemeral port with no listener behind it.
        let port = {
            let probe = TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let mut endpoint = StreamEndpoint::connect(SimAddress::new([127, 0, 0, 1], port as i32));
        assert_eq!(endpoint.state(), LinkState::Idle);
        assert!(!endpoint.is_connected());
    }

    #[test]
    fn listener_reports_its_ephemeral_port() {
        let endpoint = StreamEndpoint::listen(SimAddress::new([127, 0, 0, 1], 0));
        assert_eq!(endpoint.state(), LinkState::Listening);
        let addr = endpoint.local_addr().expect("listener should be bound");
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn send_on_fresh_listener_is_a_no_op() {
        let mut endpoint = StreamEndpoint::listen(SimAddress::new([127, 0, 0, 1], 0));
        endpoint.send(b"dropped");
        assert_eq!(endpoint.state(), LinkState::Listening);
    }
}
