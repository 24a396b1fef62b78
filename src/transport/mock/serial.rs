//! Mock serial port for testing

use crate::error::{BusFault, ChannelError, Result};
use crate::transport::traits::SerialPort;
use heapless::Vec;

/// Receive buffer capacity, sized above the largest pattern
const RX_CAPACITY: usize = 512;

/// How the mock responds to transmitted data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialBehavior {
    /// Every transmitted byte comes straight back (TX wired to RX)
    Echo,
    /// Echoes all but the final byte of each write
    DropLast,
    /// Echoes with the byte at the given index inverted
    CorruptAt(usize),
    /// Transmits vanish; nothing is ever received
    Silent,
    /// Every write fails with the given bus fault
    WriteFault(BusFault),
    /// Writes succeed but the next read reports the given fault
    ReadFault(BusFault),
}

/// Mock serial port
///
/// Models a port whose TX is looped to RX with a configurable defect.
/// Open/close calls are counted for release-discipline assertions, and
/// stale bytes can be injected before open to verify that acquisition
/// drains them.
#[derive(Debug)]
pub struct MockSerial {
    behavior: SerialBehavior,
    open: bool,
    baud: u32,
    rx: Vec<u8, RX_CAPACITY>,
    rx_cursor: usize,
    fail_open: bool,
    open_count: usize,
    close_count: usize,
}

impl MockSerial {
    /// Create a mock with the given response behavior
    pub fn new(behavior: SerialBehavior) -> Self {
        Self {
            behavior,
            open: false,
            baud: 0,
            rx: Vec::new(),
            rx_cursor: 0,
            fail_open: false,
            open_count: 0,
            close_count: 0,
        }
    }

    /// Change the response behavior mid-test
    pub fn set_behavior(&mut self, behavior: SerialBehavior) {
        self.behavior = behavior;
    }

    /// Make every `open` call fail
    pub fn set_fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Queue bytes as if they arrived before the test started
    pub fn inject_rx(&mut self, data: &[u8]) {
        let _ = self.rx.extend_from_slice(data);
    }

    /// Bytes currently waiting to be read (for drain assertions)
    pub fn pending_rx(&self) -> usize {
        self.rx.len() - self.rx_cursor
    }

    /// Number of successful opens
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    /// Number of closes
    pub fn close_count(&self) -> usize {
        self.close_count
    }

    /// Whether the port is currently open
    pub fn is_open(&self) -> bool {
        self.open
    }

    fn queue_response(&mut self, data: &[u8]) {
        match self.behavior {
            SerialBehavior::Echo | SerialBehavior::ReadFault(_) => {
                let _ = self.rx.extend_from_slice(data);
            }
            SerialBehavior::DropLast => {
                if data.len() > 1 {
                    let _ = self.rx.extend_from_slice(&data[..data.len() - 1]);
                }
            }
            SerialBehavior::CorruptAt(index) => {
                for (i, &byte) in data.iter().enumerate() {
                    let _ = self.rx.push(if i == index { !byte } else { byte });
                }
            }
            SerialBehavior::Silent | SerialBehavior::WriteFault(_) => {}
        }
    }
}

impl SerialPort for MockSerial {
    fn open(&mut self, baud: u32) -> Result<()> {
        if self.fail_open {
            return Err(ChannelError::Unavailable {
                reason: "serial port claimed by console",
            });
        }
        self.open = true;
        self.baud = baud;
        self.open_count += 1;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if !self.open {
            return Err(ChannelError::Unavailable {
                reason: "serial port not open",
            });
        }
        if let SerialBehavior::WriteFault(fault) = self.behavior {
            return Err(ChannelError::Bus(fault));
        }
        self.queue_response(data);
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if !self.open {
            return Err(ChannelError::Unavailable {
                reason: "serial port not open",
            });
        }
        if let SerialBehavior::ReadFault(fault) = self.behavior {
            if self.pending_rx() > 0 {
                return Err(ChannelError::Bus(fault));
            }
        }
        let pending = &self.rx[self.rx_cursor..];
        let to_read = buffer.len().min(pending.len());
        buffer[..to_read].copy_from_slice(&pending[..to_read]);
        self.rx_cursor += to_read;
        Ok(to_read)
    }

    fn available(&self) -> bool {
        self.open && self.pending_rx() > 0
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.close_count += 1;
    }
}
