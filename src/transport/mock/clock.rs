//! Mock clock implementation for testing

use crate::transport::traits::Clock;

/// Mock clock using simulated time
///
/// `delay_us` advances the simulated clock instead of sleeping, so
/// adapter poll loops that wait on a silent bus terminate instantly in
/// tests while still observing their deadlines.
#[derive(Debug, Default)]
pub struct MockClock {
    now_us: u64,
}

impl MockClock {
    /// Create a new mock clock at t=0
    pub fn new() -> Self {
        Self { now_us: 0 }
    }

    /// Manually advance simulated time (for test setup)
    pub fn advance_us(&mut self, us: u64) {
        self.now_us = self.now_us.wrapping_add(us);
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        self.now_us
    }

    fn delay_us(&mut self, us: u32) {
        self.now_us = self.now_us.wrapping_add(us as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_advances_on_delay() {
        let mut clock = MockClock::new();
        assert_eq!(clock.now_us(), 0);

        clock.delay_us(1000);
        assert_eq!(clock.now_us(), 1000);

        clock.delay_ms(2);
        assert_eq!(clock.now_us(), 3000);
    }

    #[test]
    fn test_mock_clock_manual_advance() {
        let mut clock = MockClock::new();
        clock.advance_us(500);
        assert_eq!(clock.now_us(), 500);
    }
}
