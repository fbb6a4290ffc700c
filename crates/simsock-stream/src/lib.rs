#![warn(missing_docs)]

//! simsock-stream: poll-driven TCP bridge endpoint.
//!
//! A [`StreamEndpoint`] exposes TCP connection establishment and byte-stream
//! I/O to a caller that cannot block or run an event loop. Every operation
//! is a single non-blocking request that returns immediately; "waiting" is
//! expressed as the caller polling again on its own schedule. A pending
//! passive accept is completed lazily as the first step of every public
//! operation, so a caller that only ever sends or receives still picks up
//! its peer.

/// Connection lifecycle states.
pub mod state;

/// The stream endpoint: passive/active open, polled send/receive.
pub mod endpoint;

pub use endpoint::StreamEndpoint;
pub use state::LinkState;
