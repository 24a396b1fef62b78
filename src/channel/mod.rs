//! Channel adapters
//!
//! A channel adapter wraps one transport behind the uniform
//! acquire/transact/release contract the verifier drives. Acquisition
//! is scoped and exclusive: a [`Channel`] is a move-only token, so two
//! attempts can never drive the same bus concurrently and a double
//! release is unrepresentable.

pub mod ble;
pub mod can;
pub mod config;
pub mod gpio_pair;
pub mod uart;

use crate::error::Result;
use bitflags::bitflags;

pub use ble::BleEchoAdapter;
pub use can::CanLoopbackAdapter;
pub use config::{
    AdapterVariant, BleEchoConfig, CanLoopbackConfig, ChannelConfig, GpioPairConfig,
    UartEchoConfig,
};
pub use gpio_pair::GpioPairAdapter;
pub use uart::UartEchoAdapter;

/// Poll pacing for deadline loops inside `transact`
pub(crate) const POLL_INTERVAL_US: u32 = 100;

/// What one unit of a pattern means on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferUnit {
    /// Units are bytes; comparison is byte-for-byte
    Bytes,
    /// Units are logic levels carried in each byte's LSB
    Levels,
}

bitflags! {
    /// Channel capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CapFlags: u8 {
        /// Transmit and receive paths are independent
        const DUPLEX = 1 << 0;
        /// Echo happens inside the controller, no external wiring needed
        const INTERNAL_LOOPBACK = 1 << 1;
        /// Hardware flags framing/CRC faults on its own
        const HW_ERROR_DETECTION = 1 << 2;
    }
}

/// Capability attributes of an acquired channel
#[derive(Debug, Clone, Copy)]
pub struct ChannelCaps {
    /// Largest pattern this channel accepts in one transaction
    pub max_transfer_len: usize,
    /// Nominal bit-rate in bit/s (0 when not meaningful)
    pub bit_rate: u32,
    /// Comparison granularity for echoed data
    pub unit: TransferUnit,
    /// Capability flags
    pub flags: CapFlags,
}

/// An exclusively-owned, configured transport handle
///
/// Only adapters construct these; holding one is proof of acquisition.
/// Not `Clone`: ownership moves into `release` exactly once.
#[derive(Debug)]
pub struct Channel {
    caps: ChannelCaps,
}

impl Channel {
    pub(crate) fn new(caps: ChannelCaps) -> Self {
        Self { caps }
    }

    /// Capability attributes declared at acquisition
    pub fn caps(&self) -> &ChannelCaps {
        &self.caps
    }
}

/// Completed transfer statistics returned by `transact`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Units actually received (may be short of the sent length)
    pub len: usize,
    /// Wall time the transaction took
    pub elapsed_us: u64,
}

/// The uniform four-operation channel contract
///
/// One adapter instance wraps one physical resource. All variants obey
/// the same rules:
/// - `acquire` validates the whole configuration up front and leaves
///   the bus configured; a config for a different variant is rejected
///   with `Unavailable` (fail fast, nothing silently ignored)
/// - `transact` never blocks past its timeout; partial data at the
///   deadline comes back as a short [`Transfer`], no data is `Timeout`
/// - `release` consumes the channel and restores the bus to an inert,
///   non-driving state on every path
pub trait ChannelAdapter {
    /// Which variant this adapter implements
    fn variant(&self) -> AdapterVariant;

    /// Configure the transport and take exclusive ownership
    ///
    /// # Errors
    ///
    /// - `ChannelError::Unavailable` if the hardware cannot be opened,
    ///   the config targets a different variant, or a channel is
    ///   already outstanding
    /// - `ChannelError::InvalidConfig` if a recognized option carries
    ///   an unusable value
    fn acquire(&mut self, config: &ChannelConfig) -> Result<Channel>;

    /// Write `tx` and read the echo into `rx`, bounded by `timeout_us`
    ///
    /// Reads back at most `tx.len()` units. `rx` must be at least as
    /// long as `tx`.
    ///
    /// # Errors
    ///
    /// - `ChannelError::Timeout` if nothing came back in time
    /// - `ChannelError::Bus` on a hardware-signaled fault
    /// - `ChannelError::Unavailable` if the underlying link dropped
    fn transact(
        &mut self,
        channel: &mut Channel,
        tx: &[u8],
        rx: &mut [u8],
        timeout_us: u64,
    ) -> Result<Transfer>;

    /// Return the transport to an inert state and give up ownership
    fn release(&mut self, channel: Channel);
}
