//! Error types and results.
//!
//! These errors never cross the polling boundary: endpoints swallow setup
//! failures into an inert handle (streams) or a negative sentinel
//! (datagrams) and log the detail. The types here carry that detail between
//! the internal setup helpers and the log statements.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Failures that can occur while setting up or driving a bridge socket.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The OS refused to create or configure a socket.
    #[error("unable to create socket: {0}")]
    SocketCreation(io::Error),
    /// Binding the local address failed.
    #[error("unable to bind {addr}: {source}")]
    Bind {
        /// The local address that could not be bound.
        addr: SocketAddr,
        /// The underlying OS error.
        source: io::Error,
    },
    /// Switching the bound socket to listening failed.
    #[error("unable to listen on {addr}: {source}")]
    Listen {
        /// The local address of the listener.
        addr: SocketAddr,
        /// The underlying OS error.
        source: io::Error,
    },
    /// The active open was refused or otherwise failed.
    #[error("unable to connect to {addr}: {source}")]
    Connect {
        /// The remote address that was dialed.
        addr: SocketAddr,
        /// The underlying OS error.
        source: io::Error,
    },
    /// Any other I/O failure.
    #[error("i/o failure: {0}")]
    IOError(#[from] io::Error),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ErrorKind>;
