//! BLE link interface
//!
//! The BLE echo test talks to an onboard module that exposes a serial
//! pipe once a central connects. Connection establishment is its own
//! phase: the adapter initiates it during acquire and polls
//! `is_connected` under a deadline, so a module that never answers
//! surfaces as `ChannelUnavailable` rather than an echo failure.

use crate::error::Result;

/// BLE module link interface
///
/// # Safety Invariants
///
/// - Only one owner per link instance
/// - `write`/`read` are only valid while connected
/// - `disconnect` is safe to call in any state
pub trait BleLink {
    /// Pulse the module's hardware reset line, if it has one
    ///
    /// Default is a no-op for modules without a reset pin.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset line cannot be driven.
    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    /// Start advertising/connecting on the given service
    ///
    /// Non-blocking: begins the handshake; completion is observed via
    /// [`BleLink::is_connected`].
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Unavailable` if the module is absent or
    /// rejects the service.
    fn connect(&mut self, service_uuid: &[u8; 16]) -> Result<()>;

    /// Whether a central is connected and the pipe is open
    fn is_connected(&self) -> bool;

    /// Write bytes to the connected central
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Unavailable` if the link dropped.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read echoed bytes, non-blocking
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Unavailable` if the link dropped.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Tear the connection down and stop advertising
    fn disconnect(&mut self);
}
