//! Serial port interface
//!
//! Byte-stream transport used by the UART echo test (and by the BLE
//! module behind its own link trait). Reads are non-blocking; the
//! adapter owns the deadline.

use crate::error::Result;

/// Serial port interface
///
/// # Safety Invariants
///
/// - Only one owner per port instance
/// - `write`/`read` are only valid between `open` and `close`
/// - `close` is safe to call on an unopened port
pub trait SerialPort {
    /// Open and configure the port
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Unavailable` if the port cannot be
    /// claimed, or `ChannelError::InvalidConfig` for an unusable baud.
    fn open(&mut self, baud: u32) -> Result<()>;

    /// Write bytes, returning how many were accepted
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Bus` on a hardware fault.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read available bytes into `buffer`, returning how many were read
    ///
    /// Non-blocking: returns `Ok(0)` when nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Bus` on framing/parity/overrun faults.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Whether receive data is pending
    fn available(&self) -> bool;

    /// Block until queued transmit data has left the shift register
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Bus` on a hardware fault.
    fn flush(&mut self) -> Result<()>;

    /// Close the port, releasing the pins
    fn close(&mut self);
}
