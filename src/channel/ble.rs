//! BLE echo adapter
//!
//! Talks to an onboard BLE module exposing a serial pipe. The
//! connection handshake belongs to acquisition: a module that never
//! connects is `ChannelUnavailable`, which the verifier treats as
//! hardware absence rather than an echo failure. A link that drops
//! mid-transfer surfaces from `transact` and triggers re-acquisition.

use crate::channel::{
    AdapterVariant, BleEchoConfig, CapFlags, Channel, ChannelAdapter, ChannelCaps, ChannelConfig,
    Transfer, TransferUnit, POLL_INTERVAL_US,
};
use crate::error::{ChannelError, Result};
use crate::transport::traits::{BleLink, Clock};

/// Largest echo payload the BLE pipe accepts in one transaction
pub const BLE_MAX_TRANSFER: usize = 244;

/// Channel adapter for BLE echo-back
#[derive(Debug)]
pub struct BleEchoAdapter<L: BleLink, C: Clock> {
    link: L,
    clock: C,
    active: Option<BleEchoConfig>,
}

impl<L: BleLink, C: Clock> BleEchoAdapter<L, C> {
    /// Wrap a BLE link and a clock
    pub fn new(link: L, clock: C) -> Self {
        Self {
            link,
            clock,
            active: None,
        }
    }

    /// Access the underlying link (test inspection)
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Mutable access to the underlying link (fault injection)
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

impl<L: BleLink, C: Clock> ChannelAdapter for BleEchoAdapter<L, C> {
    fn variant(&self) -> AdapterVariant {
        AdapterVariant::Ble
    }

    fn acquire(&mut self, config: &ChannelConfig) -> Result<Channel> {
        let ChannelConfig::Ble(cfg) = config else {
            return Err(ChannelError::Unavailable {
                reason: "config is not a BLE config",
            });
        };
        if self.active.is_some() {
            return Err(ChannelError::Unavailable {
                reason: "BLE link already acquired",
            });
        }
        if cfg.connect_timeout_us == 0 {
            return Err(ChannelError::InvalidConfig {
                reason: "connect_timeout_us must be nonzero",
            });
        }

        if cfg.reset_module {
            self.link.reset()?;
        }
        self.link.connect(&cfg.service_uuid)?;

        // Handshake under its own budget; failure here is hardware
        // absence, not an echo mismatch
        let deadline = self.clock.now_us().saturating_add(cfg.connect_timeout_us);
        while !self.link.is_connected() {
            if self.clock.now_us() >= deadline {
                self.link.disconnect();
                return Err(ChannelError::Unavailable {
                    reason: "BLE handshake timed out",
                });
            }
            self.clock.delay_us(POLL_INTERVAL_US);
        }

        self.active = Some(*cfg);
        Ok(Channel::new(ChannelCaps {
            max_transfer_len: BLE_MAX_TRANSFER,
            bit_rate: 9_600,
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
                reason: "BLE link not acquired",
            });
        }

        let start = self.clock.now_us();
        let deadline = start.saturating_add(timeout_us);

        let mut written = 0;
        while written < tx.len() {
            written += self.link.write(&tx[written..])?;
            if self.clock.now_us() >= deadline {
                return Err(ChannelError::Timeout);
            }
        }

        let want = tx.len().min(rx.len());
        let mut received = 0;
        while received < want {
            let n = self.link.read(&mut rx[received..want])?;
            received += n;
            if received >= want {
                break;
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
        self.link.disconnect();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockBle, MockClock};

    fn adapter() -> BleEchoAdapter<MockBle, MockClock> {
        BleEchoAdapter::new(MockBle::new(), MockClock::new())
    }

    fn config() -> ChannelConfig {
        ChannelConfig::Ble(BleEchoConfig::default())
    }

    #[test]
    fn test_handshake_then_echo() {
        let mut adapter = adapter();
        let mut channel = adapter.acquire(&config()).unwrap();
        assert_eq!(adapter.link().connect_count(), 1);
        assert_eq!(adapter.link().reset_count(), 1);

        let tx = *b"boardtest";
        let mut rx = [0u8; 9];
        let transfer = adapter
            .transact(&mut channel, &tx, &mut rx, 1_000_000)
            .unwrap();

        assert_eq!(transfer.len, 9);
        assert_eq!(rx, tx);
        adapter.release(channel);
        assert_eq!(adapter.link().disconnect_count(), 1);
    }

    #[test]
    fn test_handshake_timeout_is_unavailable() {
        let mut adapter = adapter();
        adapter.link_mut().set_connectable(false);

        let result = adapter.acquire(&config());
        assert!(matches!(result, Err(ChannelError::Unavailable { .. })));
        // The failed handshake must leave the link torn down
        assert_eq!(adapter.link().disconnect_count(), 1);
    }

    #[test]
    fn test_silent_module_times_out_after_connect() {
        let mut adapter = adapter();
        adapter.link_mut().set_echo(false);
        let mut channel = adapter.acquire(&config()).unwrap();

        let mut rx = [0u8; 3];
        assert_eq!(
            adapter.transact(&mut channel, &[1, 2, 3], &mut rx, 10_000),
            Err(ChannelError::Timeout)
        );
        adapter.release(channel);
    }

    #[test]
    fn test_link_drop_surfaces_as_unavailable() {
        let mut adapter = adapter();
        let mut channel = adapter.acquire(&config()).unwrap();
        adapter.link_mut().drop_on_next_write();

        let mut rx = [0u8; 1];
        assert!(matches!(
            adapter.transact(&mut channel, &[0], &mut rx, 10_000),
            Err(ChannelError::Unavailable { .. })
        ));
        adapter.release(channel);
    }

    #[test]
    fn test_no_reset_when_disabled() {
        let mut adapter = adapter();
        let cfg = ChannelConfig::Ble(BleEchoConfig {
            reset_module: false,
            ..Default::default()
        });
        let channel = adapter.acquire(&cfg).unwrap();
        assert_eq!(adapter.link().reset_count(), 0);
        adapter.release(channel);
    }
}
