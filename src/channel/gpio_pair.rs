//! GPIO pin-pair adapter
//!
//! Treats the pattern as a sequence of logic levels (the LSB of each
//! unit): for every unit the driving pin is set, the wire is given time
//! to settle, and the sampling pin is read back as 0x00/0x01. The
//! reverse direction is a second plan entry with `direction` swapped.

use crate::channel::{
    AdapterVariant, CapFlags, Channel, ChannelAdapter, ChannelCaps, ChannelConfig,
    GpioPairConfig, Transfer, TransferUnit,
};
use crate::error::{ChannelError, Result};
use crate::stimulus::MAX_PATTERN_LEN;
use crate::transport::traits::{Clock, PinPair};

/// Channel adapter for an externally tied GPIO pin pair
#[derive(Debug)]
pub struct GpioPairAdapter<P: PinPair, C: Clock> {
    pair: P,
    clock: C,
    active: Option<GpioPairConfig>,
}

impl<P: PinPair, C: Clock> GpioPairAdapter<P, C> {
    /// Wrap a pin pair and a clock
    pub fn new(pair: P, clock: C) -> Self {
        Self {
            pair,
            clock,
            active: None,
        }
    }

    /// Access the underlying pair (test inspection)
    pub fn pair(&self) -> &P {
        &self.pair
    }

    /// Mutable access to the underlying pair (fault injection)
    pub fn pair_mut(&mut self) -> &mut P {
        &mut self.pair
    }
}

impl<P: PinPair, C: Clock> ChannelAdapter for GpioPairAdapter<P, C> {
    fn variant(&self) -> AdapterVariant {
        AdapterVariant::GpioPair
    }

    fn acquire(&mut self, config: &ChannelConfig) -> Result<Channel> {
        let ChannelConfig::GpioPair(cfg) = config else {
            return Err(ChannelError::Unavailable {
                reason: "config is not a GPIO pair config",
            });
        };
        if self.active.is_some() {
            return Err(ChannelError::Unavailable {
                reason: "GPIO pair already acquired",
            });
        }
        if cfg.settle_us == 0 {
            return Err(ChannelError::InvalidConfig {
                reason: "settle_us must be nonzero",
            });
        }

        self.pair.configure(cfg.drive, cfg.direction)?;
        self.active = Some(*cfg);

        Ok(Channel::new(ChannelCaps {
            max_transfer_len: MAX_PATTERN_LEN,
            bit_rate: 1_000_000 / cfg.settle_us,
            unit: TransferUnit::Levels,
            flags: CapFlags::empty(),
        }))
    }

    fn transact(
        &mut self,
        _channel: &mut Channel,
        tx: &[u8],
        rx: &mut [u8],
        timeout_us: u64,
    ) -> Result<Transfer> {
        let Some(cfg) = self.active else {
            return Err(ChannelError::Unavailable {
                reason: "GPIO pair not acquired",
            });
        };

        let start = self.clock.now_us();
        let deadline = start.saturating_add(timeout_us);
        let count = tx.len().min(rx.len());

        for (i, unit) in tx.iter().take(count).enumerate() {
            if self.clock.now_us() >= deadline {
                // Out of budget mid-pattern; partial data is a
                // mismatch, no data at all is a timeout
                if i == 0 {
                    return Err(ChannelError::Timeout);
                }
                return Ok(Transfer {
                    len: i,
                    elapsed_us: self.clock.now_us() - start,
                });
            }

            self.pair.drive(unit & 1 != 0)?;
            self.clock.delay_us(cfg.settle_us);
            rx[i] = if self.pair.sense()? { 0x01 } else { 0x00 };
        }

        Ok(Transfer {
            len: count,
            elapsed_us: self.clock.now_us() - start,
        })
    }

    fn release(&mut self, channel: Channel) {
        drop(channel);
        self.pair.set_inert();
        self.active = None;
    }
}
