#![warn(missing_docs)]

//! Simsock: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports the pieces
//! needed to bridge a polled simulation model onto real sockets:
//!
//! - Stream endpoint and its lifecycle states (`StreamEndpoint`, `LinkState`)
//! - Datagram endpoint (`DatagramEndpoint`)
//! - Address record and codec (`SimAddress`)
//! - Core configuration (`Config`)
//!
//! Example
//! ```
//! use simsock::{DatagramEndpoint, SimAddress};
//!
//! let mut a = DatagramEndpoint::bind_any();
//! let mut b = DatagramEndpoint::bind_any();
//!
//! let target = match b.local_addr().unwrap() {
//!     std::net::SocketAddr::V4(v4) => SimAddress::from_socket_addr(v4),
//!     _ => unreachable!(),
//! };
//!
//! assert_eq!(a.send_to(target, b"ping"), 4);
//!
//! // Poll until the datagram lands.
//! for _ in 0..1000 {
//!     if b.available_bytes() > 0 {
//!         break;
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//!
//! let mut buf = [0u8; 16];
//! let (count, sender) = b.receive_from(&mut buf);
//! assert_eq!(count, 4);
//! assert_eq!(&buf[..4], b"ping");
//! assert_eq!(sender.ip, [127, 0, 0, 1]);
//! ```

// Core config, address codec, errors and clock
pub use simsock_core::{
    addr::SimAddress,
    config::Config,
    error::{ErrorKind, Result},
    time::{Clock, SystemClock},
};
// Datagram endpoint
pub use simsock_datagram::DatagramEndpoint;
// Stream endpoint and its connection states
pub use simsock_stream::{LinkState, StreamEndpoint};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{Config, DatagramEndpoint, LinkState, SimAddress, StreamEndpoint};
}
