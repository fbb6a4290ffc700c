#![warn(missing_docs)]

//! simsock-core: foundational types for the simsock bridge.
//!
//! This crate provides the minimal set of core utilities shared by both
//! transport endpoints:
//! - Address record and codec
//! - Configuration types
//! - Error handling
//! - Clock abstraction for diagnostic time stamping
//!
//! The actual socket-driving endpoints live in the specialized crates:
//! - `simsock-stream`: poll-driven TCP endpoint
//! - `simsock-datagram`: poll-driven UDP endpoint

/// Protocol constants shared across layers.
pub mod constants {
    /// Backlog for passive-open listeners. A single peer is expected per
    /// endpoint, so the queue holds exactly one pending connection.
    pub const LISTEN_BACKLOG: i32 = 1;
    /// Default capacity of the scratch buffer used for availability peeks.
    /// This also caps the byte count one availability poll can report.
    pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 65536;
}

/// Address record crossing the co-simulation boundary, and its codec.
pub mod addr;
/// Configuration options for bridge endpoints.
pub mod config;
/// Error types and results.
pub mod error;
/// Time source abstraction for diagnostic stamping.
pub mod time;
