#![warn(missing_docs)]

//! simsock-datagram: poll-driven UDP bridge endpoint.
//!
//! A [`DatagramEndpoint`] exposes connectionless datagram exchange to a
//! caller that cannot block or run an event loop. One socket is bound at
//! construction and lives for the endpoint's whole lifetime; there is no
//! connection state to establish or tear down. Unlike the stream side,
//! errors here are surfaced to the caller directly as a negative count.

/// The datagram endpoint: bind, send-to, polled receive-from.
pub mod endpoint;

pub use endpoint::DatagramEndpoint;
