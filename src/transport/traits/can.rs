//! CAN controller interface
//!
//! The loopback test drives the controller either against a real
//! terminated bus or in internal loopback mode, where transmitted
//! frames are self-received without a second node.

use crate::error::Result;
use heapless::Vec;

/// Maximum classic CAN payload per frame
pub const CAN_MAX_PAYLOAD: usize = 8;

/// One classic CAN data frame (11-bit identifier)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    /// Standard 11-bit identifier
    pub id: u16,
    /// Payload, up to [`CAN_MAX_PAYLOAD`] bytes
    pub data: Vec<u8, CAN_MAX_PAYLOAD>,
}

impl CanFrame {
    /// Build a frame from a payload slice
    ///
    /// Returns `None` if `data` exceeds [`CAN_MAX_PAYLOAD`] bytes.
    pub fn new(id: u16, data: &[u8]) -> Option<Self> {
        if data.len() > CAN_MAX_PAYLOAD {
            return None;
        }
        let mut payload = Vec::new();
        // Length checked above
        let _ = payload.extend_from_slice(data);
        Some(Self { id, data: payload })
    }
}

/// CAN controller interface
///
/// # Safety Invariants
///
/// - Only one owner per controller instance
/// - `send`/`receive` are only valid after `configure`
/// - `shutdown` must stop the controller driving the bus and is safe
///   to call in any state
pub trait CanController {
    /// Configure bit-rate and loopback mode, entering the active state
    ///
    /// Reconfiguration while active is allowed (used by the automatic
    /// normal-to-loopback fallback) and discards pending frames.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Unavailable` if the controller cannot be
    /// brought up at the requested bit-rate.
    fn configure(&mut self, bitrate: u32, loopback: bool) -> Result<()>;

    /// Restrict reception to frames carrying `id`
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot be installed.
    fn set_filter(&mut self, id: u16) -> Result<()>;

    /// Queue one frame for transmission
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Bus(BusFault::ArbitrationLost)` or other
    /// bus faults signaled by the controller.
    fn send(&mut self, frame: &CanFrame) -> Result<()>;

    /// Fetch one received frame, if any
    ///
    /// Non-blocking: returns `Ok(None)` when the receive FIFO is empty.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::Bus` on CRC/form errors flagged by the
    /// controller.
    fn receive(&mut self) -> Result<Option<CanFrame>>;

    /// Take the controller off the bus (inert, not driving)
    fn shutdown(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_payload_bound() {
        assert!(CanFrame::new(0x408, &[0u8; 8]).is_some());
        assert!(CanFrame::new(0x408, &[0u8; 9]).is_none());

        let frame = CanFrame::new(0x408, &[1, 2, 3]).unwrap();
        assert_eq!(frame.id, 0x408);
        assert_eq!(&frame.data[..], &[1, 2, 3]);
    }
}
