//! Operator abort flag
//!
//! A run shares one `CancelFlag` between the operator-facing layer and
//! the engine. The verifier checks it before every attempt and the
//! sequencer before every test, so an abort is honored at the next
//! attempt boundary and never leaves a bus mid-transaction.

use core::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag
///
/// Safe to set from an interrupt or a second core; the engine only ever
/// reads it between attempts.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    /// Create a new, unset flag
    pub const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Request cancellation of the current run
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear the flag so the harness can start a fresh run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}
