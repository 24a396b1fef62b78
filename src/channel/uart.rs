//! UART echo adapter
//!
//! Byte loopback over a serial port whose TX is tied to RX (or faces
//! an external echo plug). Acquisition drains any stale receive data so
//! a previous test's leftovers can never fake a match.

use crate::channel::{
    AdapterVariant, CapFlags, Channel, ChannelAdapter, ChannelCaps, ChannelConfig, Transfer,
    TransferUnit, UartEchoConfig, POLL_INTERVAL_US,
};
use crate::error::{ChannelError, Result};
use crate::stimulus::MAX_PATTERN_LEN;
use crate::transport::traits::{Clock, SerialPort};

/// Channel adapter for UART echo
#[derive(Debug)]
pub struct UartEchoAdapter<S: SerialPort, C: Clock> {
    port: S,
    clock: C,
    active: Option<UartEchoConfig>,
}

impl<S: SerialPort, C: Clock> UartEchoAdapter<S, C> {
    /// Wrap a serial port and a clock
    pub fn new(port: S, clock: C) -> Self {
        Self {
            port,
            clock,
            active: None,
        }
    }

    /// Access the underlying port (test inspection)
    pub fn port(&self) -> &S {
        &self.port
    }

    /// Mutable access to the underlying port (fault injection)
    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    fn drain_stale_rx(&mut self) {
        let mut scratch = [0u8; 32];
        while self.port.available() {
            match self.port.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }
}

impl<S: SerialPort, C: Clock> ChannelAdapter for UartEchoAdapter<S, C> {
    fn variant(&self) -> AdapterVariant {
        AdapterVariant::Uart
    }

    fn acquire(&mut self, config: &ChannelConfig) -> Result<Channel> {
        let ChannelConfig::Uart(cfg) = config else {
            return Err(ChannelError::Unavailable {
                reason: "config is not a UART config",
            });
        };
        if self.active.is_some() {
            return Err(ChannelError::Unavailable {
                reason: "UART already acquired",
            });
        }
        if cfg.baud == 0 {
            return Err(ChannelError::InvalidConfig {
                reason: "baud must be nonzero",
            });
        }

        self.port.open(cfg.baud)?;
        self.drain_stale_rx();
        self.active = Some(*cfg);

        Ok(Channel::new(ChannelCaps {
            max_transfer_len: MAX_PATTERN_LEN,
            bit_rate: cfg.baud,
            unit: TransferUnit::Bytes,
            flags: CapFlags::DUPLEX,
        }))
    }

    fn transact(
        &mut self,
        _channel: &mut Channel,
        tx: &[u8],
        rx: &mut [u8],
        timeout_us: u64,
    ) -> Result<Transfer> {
        if self.active.is_none() {
            return Err(ChannelError::Unavailable {
                reason: "UART not acquired",
            });
        }

        let start = self.clock.now_us();
        let deadline = start.saturating_add(timeout_us);

        // Push the whole stimulus out first; echo arrives concurrently
        // on the duplex path
        let mut written = 0;
        while written < tx.len() {
            written += self.port.write(&tx[written..])?;
            if self.clock.now_us() >= deadline {
                return Err(ChannelError::Timeout);
            }
        }
        self.port.flush()?;

        let want = tx.len().min(rx.len());
        let mut received = 0;
        while received < want {
            if self.port.available() {
                received += self.port.read(&mut rx[received..want])?;
                continue;
            }
            if self.clock.now_us() >= deadline {
                break;
            }
            self.clock.delay_us(POLL_INTERVAL_US);
        }

        if received == 0 {
            return Err(ChannelError::Timeout);
        }
        Ok(Transfer {
            len: received,
            elapsed_us: self.clock.now_us() - start,
        })
    }

    fn release(&mut self, channel: Channel) {
        drop(channel);
        self.port.close();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BusFault;
    use crate::transport::mock::{MockClock, MockSerial, SerialBehavior};

    fn adapter(behavior: SerialBehavior) -> UartEchoAdapter<MockSerial, MockClock> {
        UartEchoAdapter::new(MockSerial::new(behavior), MockClock::new())
    }

    fn config() -> ChannelConfig {
        ChannelConfig::Uart(UartEchoConfig::default())
    }

    #[test]
    fn test_echo_round_trip() {
        let mut adapter = adapter(SerialBehavior::Echo);
        let mut channel = adapter.acquire(&config()).unwrap();

        let tx = [0xDE, 0xAD, 0xBE, 0xEF];
        let mut rx = [0u8; 4];
        let transfer = adapter
            .transact(&mut channel, &tx, &mut rx, 1_000_000)
            .unwrap();

        assert_eq!(transfer.len, 4);
        assert_eq!(rx, tx);
        adapter.release(channel);
        assert!(!adapter.port().is_open());
    }

    #[test]
    fn test_acquire_drains_stale_rx() {
        let mut adapter = adapter(SerialBehavior::Echo);
        adapter.port_mut().inject_rx(&[0x11, 0x22, 0x33]);

        let channel = adapter.acquire(&config()).unwrap();
        assert_eq!(adapter.port().pending_rx(), 0);
        adapter.release(channel);
    }

    #[test]
    fn test_silent_port_times_out() {
        let mut adapter = adapter(SerialBehavior::Silent);
        let mut channel = adapter.acquire(&config()).unwrap();

        let tx = [1, 2, 3];
        let mut rx = [0u8; 3];
        let result = adapter.transact(&mut channel, &tx, &mut rx, 10_000);
        assert_eq!(result, Err(ChannelError::Timeout));
        adapter.release(channel);
    }

    #[test]
    fn test_dropped_byte_returns_short() {
        let mut adapter = adapter(SerialBehavior::DropLast);
        let mut channel = adapter.acquire(&config()).unwrap();

        let tx = [1, 2, 3, 4];
        let mut rx = [0u8; 4];
        let transfer = adapter
            .transact(&mut channel, &tx, &mut rx, 10_000)
            .unwrap();
        assert_eq!(transfer.len, 3);
        assert_eq!(&rx[..3], &[1, 2, 3]);
        adapter.release(channel);
    }

    #[test]
    fn test_bus_fault_propagates() {
        let mut adapter = adapter(SerialBehavior::WriteFault(BusFault::Framing));
        let mut channel = adapter.acquire(&config()).unwrap();

        let mut rx = [0u8; 1];
        assert_eq!(
            adapter.transact(&mut channel, &[0], &mut rx, 10_000),
            Err(ChannelError::Bus(BusFault::Framing))
        );
        adapter.release(channel);
    }

    #[test]
    fn test_zero_baud_rejected() {
        let mut adapter = adapter(SerialBehavior::Echo);
        let cfg = ChannelConfig::Uart(UartEchoConfig { baud: 0 });
        assert!(matches!(
            adapter.acquire(&cfg),
            Err(ChannelError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_fail_open_is_unavailable() {
        let mut adapter = adapter(SerialBehavior::Echo);
        adapter.port_mut().set_fail_open(true);
        assert!(matches!(
            adapter.acquire(&config()),
            Err(ChannelError::Unavailable { .. })
        ));
    }
}
