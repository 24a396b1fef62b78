//! Mock GPIO pin pair for testing

use crate::error::{ChannelError, Result};
use crate::transport::traits::{GpioDrive, PairDirection, PinPair};

/// Mock pin pair
///
/// Simulates two pins tied together by an external wire. The wire can
/// be cut (`set_wired(false)`, sampling floats low) or stuck at a level
/// to exercise mismatch paths. Lifecycle calls are counted so tests can
/// assert release-exactly-once behavior.
#[derive(Debug)]
pub struct MockPinPair {
    wired: bool,
    stuck_at: Option<bool>,
    driven: bool,
    configured: Option<(GpioDrive, PairDirection)>,
    fail_configure: bool,
    configure_count: usize,
    inert_count: usize,
}

impl MockPinPair {
    /// Create a pair with the wire in place (healthy hardware)
    pub fn wired() -> Self {
        Self {
            wired: true,
            stuck_at: None,
            driven: false,
            configured: None,
            fail_configure: false,
            configure_count: 0,
            inert_count: 0,
        }
    }

    /// Simulate the tie wire being present or cut
    pub fn set_wired(&mut self, wired: bool) {
        self.wired = wired;
    }

    /// Force the sampled side to a fixed level (short to rail)
    pub fn set_stuck_at(&mut self, level: Option<bool>) {
        self.stuck_at = level;
    }

    /// Make every `configure` call fail (pins claimed elsewhere)
    pub fn set_fail_configure(&mut self, fail: bool) {
        self.fail_configure = fail;
    }

    /// How many times the pair was configured
    pub fn configure_count(&self) -> usize {
        self.configure_count
    }

    /// How many times the pair was returned to high impedance
    pub fn inert_count(&self) -> usize {
        self.inert_count
    }

    /// Whether the pair currently sits in the inert state
    pub fn is_inert(&self) -> bool {
        self.configured.is_none()
    }
}

impl PinPair for MockPinPair {
    fn configure(&mut self, drive: GpioDrive, direction: PairDirection) -> Result<()> {
        if self.fail_configure {
            return Err(ChannelError::Unavailable {
                reason: "pins claimed by another peripheral",
            });
        }
        self.configured = Some((drive, direction));
        self.configure_count += 1;
        Ok(())
    }

    fn drive(&mut self, level: bool) -> Result<()> {
        if self.configured.is_none() {
            return Err(ChannelError::Unavailable {
                reason: "pin pair not configured",
            });
        }
        self.driven = level;
        Ok(())
    }

    fn sense(&self) -> Result<bool> {
        if self.configured.is_none() {
            return Err(ChannelError::Unavailable {
                reason: "pin pair not configured",
            });
        }
        if let Some(level) = self.stuck_at {
            return Ok(level);
        }
        // A cut wire leaves the input floating; reads low in this model
        Ok(self.wired && self.driven)
    }

    fn set_inert(&mut self) {
        self.configured = None;
        self.driven = false;
        self.inert_count += 1;
    }
}
