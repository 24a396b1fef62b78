//! Mock CAN controller for testing

use crate::error::{BusFault, ChannelError, Result};
use crate::transport::traits::{CanController, CanFrame};
use heapless::Vec;

/// Receive FIFO depth
const FIFO_DEPTH: usize = 16;

/// Mock CAN controller
///
/// In loopback mode every sent frame is self-received, matching the
/// behavior of a controller's internal loopback. In normal mode frames
/// are only received when `external_responder` is set, which models a
/// second node echoing on a real bus; without it the first receive
/// times out and exercises the automatic loopback fallback.
#[derive(Debug)]
pub struct MockCan {
    configured: Option<(u32, bool)>,
    filter: Option<u16>,
    fifo: Vec<CanFrame, FIFO_DEPTH>,
    fifo_cursor: usize,
    external_responder: bool,
    respond_with_id: Option<u16>,
    send_fault: Option<BusFault>,
    fail_configure: bool,
    configure_count: usize,
    shutdown_count: usize,
}

impl MockCan {
    /// Create a healthy controller
    pub fn new() -> Self {
        Self {
            configured: None,
            filter: None,
            fifo: Vec::new(),
            fifo_cursor: 0,
            external_responder: false,
            respond_with_id: None,
            send_fault: None,
            fail_configure: false,
            configure_count: 0,
            shutdown_count: 0,
        }
    }

    /// Simulate a second node echoing frames in normal mode
    pub fn set_external_responder(&mut self, present: bool) {
        self.external_responder = present;
    }

    /// Respond with a different identifier than was sent
    pub fn set_respond_with_id(&mut self, id: Option<u16>) {
        self.respond_with_id = id;
    }

    /// Make every `send` fail with the given fault
    pub fn set_send_fault(&mut self, fault: Option<BusFault>) {
        self.send_fault = fault;
    }

    /// Make every `configure` call fail
    pub fn set_fail_configure(&mut self, fail: bool) {
        self.fail_configure = fail;
    }

    /// Whether the controller is in loopback mode
    pub fn is_loopback(&self) -> bool {
        matches!(self.configured, Some((_, true)))
    }

    /// Whether the controller has been shut down (or never configured)
    pub fn is_shutdown(&self) -> bool {
        self.configured.is_none()
    }

    /// Number of successful configure calls
    pub fn configure_count(&self) -> usize {
        self.configure_count
    }

    /// Number of shutdown calls
    pub fn shutdown_count(&self) -> usize {
        self.shutdown_count
    }

    /// Queue a frame as if it arrived from the bus (for drain tests)
    pub fn inject_frame(&mut self, frame: CanFrame) {
        let _ = self.fifo.push(frame);
    }
}

impl Default for MockCan {
    fn default() -> Self {
        Self::new()
    }
}

impl CanController for MockCan {
    fn configure(&mut self, bitrate: u32, loopback: bool) -> Result<()> {
        if self.fail_configure {
            return Err(ChannelError::Unavailable {
                reason: "CAN controller failed to reach active state",
            });
        }
        self.configured = Some((bitrate, loopback));
        self.configure_count += 1;
        // Reconfiguration discards anything pending
        self.fifo.clear();
        self.fifo_cursor = 0;
        Ok(())
    }

    fn set_filter(&mut self, id: u16) -> Result<()> {
        if self.configured.is_none() {
            return Err(ChannelError::Unavailable {
                reason: "CAN controller not configured",
            });
        }
        self.filter = Some(id);
        Ok(())
    }

    fn send(&mut self, frame: &CanFrame) -> Result<()> {
        let Some((_, loopback)) = self.configured else {
            return Err(ChannelError::Unavailable {
                reason: "CAN controller not configured",
            });
        };
        if let Some(fault) = self.send_fault {
            return Err(ChannelError::Bus(fault));
        }
        if loopback || self.external_responder {
            let mut echoed = frame.clone();
            if let Some(id) = self.respond_with_id {
                echoed.id = id;
            }
            let _ = self.fifo.push(echoed);
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<CanFrame>> {
        if self.configured.is_none() {
            return Err(ChannelError::Unavailable {
                reason: "CAN controller not configured",
            });
        }
        if self.fifo_cursor < self.fifo.len() {
            let frame = self.fifo[self.fifo_cursor].clone();
            self.fifo_cursor += 1;
            Ok(Some(frame))
        } else {
            Ok(None)
        }
    }

    fn shutdown(&mut self) {
        self.configured = None;
        self.filter = None;
        self.fifo.clear();
        self.fifo_cursor = 0;
        self.shutdown_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_self_receives() {
        let mut can = MockCan::new();
        can.configure(250_000, true).unwrap();
        can.set_filter(0x408).unwrap();

        let frame = CanFrame::new(0x408, &[1, 2, 3, 4]).unwrap();
        can.send(&frame).unwrap();

        let rx = can.receive().unwrap().unwrap();
        assert_eq!(rx, frame);
        assert!(can.receive().unwrap().is_none());
    }

    #[test]
    fn test_normal_mode_without_responder_is_silent() {
        let mut can = MockCan::new();
        can.configure(250_000, false).unwrap();

        let frame = CanFrame::new(0x408, &[1]).unwrap();
        can.send(&frame).unwrap();
        assert!(can.receive().unwrap().is_none());
    }

    #[test]
    fn test_wrong_id_injection() {
        let mut can = MockCan::new();
        can.configure(250_000, true).unwrap();
        can.set_respond_with_id(Some(0x123));

        let frame = CanFrame::new(0x408, &[9]).unwrap();
        can.send(&frame).unwrap();

        let rx = can.receive().unwrap().unwrap();
        assert_eq!(rx.id, 0x123);
        assert_eq!(&rx.data[..], &[9]);
    }

    #[test]
    fn test_reconfigure_drains_fifo() {
        let mut can = MockCan::new();
        can.configure(250_000, true).unwrap();
        can.inject_frame(CanFrame::new(0x7FF, &[0xEE]).unwrap());

        can.configure(250_000, false).unwrap();
        assert!(can.receive().unwrap().is_none());
    }

    #[test]
    fn test_send_fault() {
        let mut can = MockCan::new();
        can.configure(250_000, true).unwrap();
        can.set_send_fault(Some(BusFault::ArbitrationLost));

        let frame = CanFrame::new(0x408, &[0]).unwrap();
        assert_eq!(
            can.send(&frame),
            Err(ChannelError::Bus(BusFault::ArbitrationLost))
        );
    }

    #[test]
    fn test_shutdown_leaves_bus_inert() {
        let mut can = MockCan::new();
        can.configure(250_000, true).unwrap();
        can.shutdown();
        assert!(can.is_shutdown());
        assert_eq!(can.shutdown_count(), 1);
        assert!(can.send(&CanFrame::new(0, &[]).unwrap()).is_err());
    }
}
