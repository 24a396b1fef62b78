//! Channel error taxonomy
//!
//! All transports and adapters map their bus-specific faults to these
//! variants. Severity ordering matters to the verifier: `Timeout` and
//! `Bus` faults are frequently transient and drive the retry loop,
//! `Unavailable` means the hardware cannot be opened at all and is never
//! retried, and `InvalidConfig` is a caller programming error that is
//! fatal to the test's setup.

use core::fmt;

/// Result type for channel operations
pub type Result<T> = core::result::Result<T, ChannelError>;

/// Errors surfaced by channel adapters and transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// Channel cannot be opened or configured (missing hardware, pins in
    /// use, handshake failure, config meant for a different variant)
    Unavailable {
        /// Why acquisition failed
        reason: &'static str,
    },
    /// No response arrived within the timeout budget
    Timeout,
    /// The bus signaled a hardware-level fault mid-transaction
    Bus(BusFault),
    /// A recognized option carried an unusable value
    InvalidConfig {
        /// Which value was rejected
        reason: &'static str,
    },
}

/// Bus-level faults signaled by hardware during a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusFault {
    /// Framing error (bad start/stop bits, malformed frame)
    Framing,
    /// CRC/checksum failure reported by the controller
    Crc,
    /// CAN arbitration lost
    ArbitrationLost,
    /// Receive overrun, data lost
    Overrun,
    /// A frame arrived carrying an identifier we never transmitted
    IdMismatch,
}

impl ChannelError {
    /// Whether the verifier should retry after this error.
    ///
    /// Timeouts and bus faults are often transient electrical noise;
    /// an unavailable channel or a bad config never heals on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChannelError::Timeout | ChannelError::Bus(_))
    }
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Unavailable { reason } => {
                write!(f, "channel unavailable: {}", reason)
            }
            ChannelError::Timeout => write!(f, "transaction timeout"),
            ChannelError::Bus(fault) => write!(f, "bus fault: {:?}", fault),
            ChannelError::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ChannelError::Timeout.is_transient());
        assert!(ChannelError::Bus(BusFault::Framing).is_transient());
        assert!(!ChannelError::Unavailable { reason: "x" }.is_transient());
        assert!(!ChannelError::InvalidConfig { reason: "x" }.is_transient());
    }

    #[test]
    fn test_display() {
        let e = ChannelError::Unavailable { reason: "no BLE module" };
        assert_eq!(format!("{}", e), "channel unavailable: no BLE module");
        assert_eq!(format!("{}", ChannelError::Timeout), "transaction timeout");
    }
}
