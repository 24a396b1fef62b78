//! Mock BLE link for testing

use crate::error::{ChannelError, Result};
use crate::transport::traits::BleLink;
use heapless::Vec;

/// Echo buffer capacity
const RX_CAPACITY: usize = 512;

/// Mock BLE module link
///
/// Models an onboard BLE-to-serial module. `connectable` controls
/// whether the handshake ever completes; `drop_on_next_write` drops
/// the link mid-transfer once to exercise the verifier's re-acquire
/// path.
#[derive(Debug)]
pub struct MockBle {
    connectable: bool,
    connected: bool,
    echo: bool,
    drop_next_write: bool,
    rx: Vec<u8, RX_CAPACITY>,
    rx_cursor: usize,
    reset_count: usize,
    connect_count: usize,
    disconnect_count: usize,
    last_service: Option<[u8; 16]>,
}

impl MockBle {
    /// Create a module that accepts connections and echoes perfectly
    pub fn new() -> Self {
        Self {
            connectable: true,
            connected: false,
            echo: true,
            drop_next_write: false,
            rx: Vec::new(),
            rx_cursor: 0,
            reset_count: 0,
            connect_count: 0,
            disconnect_count: 0,
            last_service: None,
        }
    }

    /// Control whether the handshake ever completes
    pub fn set_connectable(&mut self, connectable: bool) {
        self.connectable = connectable;
    }

    /// Control whether written data is echoed back
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Drop the connection on the next write (transient link loss)
    pub fn drop_on_next_write(&mut self) {
        self.drop_next_write = true;
    }

    /// Number of reset pulses seen
    pub fn reset_count(&self) -> usize {
        self.reset_count
    }

    /// Number of connect attempts
    pub fn connect_count(&self) -> usize {
        self.connect_count
    }

    /// Number of disconnects
    pub fn disconnect_count(&self) -> usize {
        self.disconnect_count
    }

    /// Service UUID from the most recent connect
    pub fn last_service(&self) -> Option<[u8; 16]> {
        self.last_service
    }
}

impl Default for MockBle {
    fn default() -> Self {
        Self::new()
    }
}

impl BleLink for MockBle {
    fn reset(&mut self) -> Result<()> {
        self.reset_count += 1;
        self.connected = false;
        self.rx.clear();
        self.rx_cursor = 0;
        Ok(())
    }

    fn connect(&mut self, service_uuid: &[u8; 16]) -> Result<()> {
        self.connect_count += 1;
        self.last_service = Some(*service_uuid);
        if self.connectable {
            self.connected = true;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.drop_next_write {
            self.drop_next_write = false;
            self.connected = false;
        }
        if !self.connected {
            return Err(ChannelError::Unavailable {
                reason: "BLE link dropped",
            });
        }
        if self.echo {
            let _ = self.rx.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if !self.connected {
            return Err(ChannelError::Unavailable {
                reason: "BLE link dropped",
            });
        }
        let pending = &self.rx[self.rx_cursor..];
        let to_read = buffer.len().min(pending.len());
        buffer[..to_read].copy_from_slice(&pending[..to_read]);
        self.rx_cursor += to_read;
        Ok(to_read)
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnect_count += 1;
        self.rx.clear();
        self.rx_cursor = 0;
    }
}
