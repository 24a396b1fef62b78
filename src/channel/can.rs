//! CAN loopback adapter
//!
//! Chunks the pattern into classic CAN frames and verifies that each
//! comes back with the same identifier and payload. In controller
//! loopback mode no second node is needed; in normal mode the adapter
//! can fall back to loopback automatically if the first frame is never
//! received, which keeps single-node bench setups usable.

use crate::channel::{
    AdapterVariant, CanLoopbackConfig, CapFlags, Channel, ChannelAdapter, ChannelCaps,
    ChannelConfig, Transfer, TransferUnit, POLL_INTERVAL_US,
};
use crate::error::{BusFault, ChannelError, Result};
use crate::log_warn;
use crate::transport::traits::{CanController, CanFrame, Clock, CAN_MAX_PAYLOAD};

/// Largest pattern a CAN channel accepts in one transaction
pub const CAN_MAX_TRANSFER: usize = 8 * CAN_MAX_PAYLOAD;

/// Highest standard 11-bit identifier
const CAN_MAX_STD_ID: u16 = 0x7FF;

/// Channel adapter for CAN self-loopback
#[derive(Debug)]
pub struct CanLoopbackAdapter<B: CanController, C: Clock> {
    can: B,
    clock: C,
    active: Option<CanLoopbackConfig>,
    in_loopback: bool,
}

impl<B: CanController, C: Clock> CanLoopbackAdapter<B, C> {
    /// Wrap a CAN controller and a clock
    pub fn new(can: B, clock: C) -> Self {
        Self {
            can,
            clock,
            active: None,
            in_loopback: false,
        }
    }

    /// Access the underlying controller (test inspection)
    pub fn controller(&self) -> &B {
        &self.can
    }

    /// Mutable access to the underlying controller (fault injection)
    pub fn controller_mut(&mut self) -> &mut B {
        &mut self.can
    }

    fn drain_rx(&mut self) {
        while let Ok(Some(_)) = self.can.receive() {}
    }

    /// Wait for one frame until `deadline`
    fn receive_until(&mut self, deadline: u64) -> Result<Option<CanFrame>> {
        loop {
            if let Some(frame) = self.can.receive()? {
                return Ok(Some(frame));
            }
            if self.clock.now_us() >= deadline {
                return Ok(None);
            }
            self.clock.delay_us(POLL_INTERVAL_US);
        }
    }

    /// Reopen the controller in internal loopback (normal-mode fallback)
    ///
    /// The caps issued at acquisition keep reporting the original mode;
    /// `INTERNAL_LOOPBACK` only appears there when the test was
    /// configured for loopback up front. `in_loopback` tracks the live
    /// mode.
    fn fall_back_to_loopback(&mut self, cfg: &CanLoopbackConfig) -> Result<()> {
        log_warn!("CAN: no echo in normal mode, retrying in controller loopback");
        self.can.configure(cfg.bitrate, true)?;
        self.can.set_filter(cfg.message_id)?;
        self.drain_rx();
        self.in_loopback = true;
        Ok(())
    }
}

impl<B: CanController, C: Clock> ChannelAdapter for CanLoopbackAdapter<B, C> {
    fn variant(&self) -> AdapterVariant {
        AdapterVariant::Can
    }

    fn acquire(&mut self, config: &ChannelConfig) -> Result<Channel> {
        let ChannelConfig::Can(cfg) = config else {
            return Err(ChannelError::Unavailable {
                reason: "config is not a CAN config",
            });
        };
        if self.active.is_some() {
            return Err(ChannelError::Unavailable {
                reason: "CAN controller already acquired",
            });
        }
        if cfg.bitrate == 0 {
            return Err(ChannelError::InvalidConfig {
                reason: "bitrate must be nonzero",
            });
        }
        if cfg.message_id > CAN_MAX_STD_ID {
            return Err(ChannelError::InvalidConfig {
                reason: "message_id exceeds 11-bit range",
            });
        }

        self.can.configure(cfg.bitrate, cfg.loopback)?;
        self.can.set_filter(cfg.message_id)?;
        self.drain_rx();
        self.in_loopback = cfg.loopback;
        self.active = Some(*cfg);

        let mut flags = CapFlags::HW_ERROR_DETECTION;
        if cfg.loopback {
            flags |= CapFlags::INTERNAL_LOOPBACK;
        }
        Ok(Channel::new(ChannelCaps {
            max_transfer_len: CAN_MAX_TRANSFER,
            bit_rate: cfg.bitrate,
            unit: TransferUnit::Bytes,
            flags,
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
                reason: "CAN controller not acquired",
            });
        };

        let start = self.clock.now_us();
        let deadline = start.saturating_add(timeout_us);
        let want = tx.len().min(rx.len());
        let mut received = 0;

        for (frame_no, chunk) in tx[..want].chunks(CAN_MAX_PAYLOAD).enumerate() {
            // Chunk length is bounded by CAN_MAX_PAYLOAD
            let Some(frame) = CanFrame::new(cfg.message_id, chunk) else {
                return Err(ChannelError::InvalidConfig {
                    reason: "frame payload exceeds CAN limit",
                });
            };
            self.can.send(&frame)?;

            let mut echoed = self.receive_until(deadline)?;
            if echoed.is_none()
                && frame_no == 0
                && !self.in_loopback
                && cfg.auto_fallback
            {
                // Single-node setup: nothing on the bus acknowledged
                // the frame. Retry the same frame in internal loopback.
                self.fall_back_to_loopback(&cfg)?;
                self.can.send(&frame)?;
                let fallback_deadline = self
                    .clock
                    .now_us()
                    .saturating_add(timeout_us);
                echoed = self.receive_until(fallback_deadline)?;
            }

            let Some(echoed) = echoed else {
                if received == 0 {
                    return Err(ChannelError::Timeout);
                }
                break;
            };

            if echoed.id != cfg.message_id {
                return Err(ChannelError::Bus(BusFault::IdMismatch));
            }

            let room = want - received;
            let take = echoed.data.len().min(room);
            rx[received..received + take].copy_from_slice(&echoed.data[..take]);
            received += take;
        }

        Ok(Transfer {
            len: received,
            elapsed_us: self.clock.now_us() - start,
        })
    }

    fn release(&mut self, channel: Channel) {
        drop(channel);
        self.can.shutdown();
        self.active = None;
        self.in_loopback = false;
    }
}
