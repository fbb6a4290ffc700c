//! Time source abstraction for diagnostic stamping.
//!
//! Endpoints record an origin instant at construction and stamp their
//! lifecycle diagnostics with the elapsed time since then. Injecting the
//! source keeps that bookkeeping out of process-wide state and lets tests
//! substitute their own notion of time.

use std::time::Instant;

/// Abstraction over a time source to improve testability.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time instant.
    fn now(&self) -> Instant;
}

/// System clock using `Instant::now()`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}
