//! Monotonic clock interface
//!
//! Adapters bound every wait with a clock: a transaction deadline is
//! computed once from `now_us` and polled against, and `delay_us` paces
//! the poll loop so a silent bus does not spin.

/// Monotonic clock interface
///
/// Platform implementations must provide this interface for deadline
/// tracking and settle delays.
///
/// # Safety Invariants
///
/// - `now_us` must be monotonically non-decreasing
/// - Resolution of 100 us or better is sufficient for all adapters
pub trait Clock {
    /// Current monotonic time in microseconds
    fn now_us(&self) -> u64;

    /// Block for at least `us` microseconds
    fn delay_us(&mut self, us: u32);

    /// Block for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}
