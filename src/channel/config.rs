//! Per-variant channel configuration
//!
//! Each adapter variant owns its configuration shape; the enum tag is
//! how a test plan names its transport. All fields are primitive-typed
//! so a plan round-trips losslessly through any serialization.

use crate::transport::traits::{GpioDrive, PairDirection};

/// Nordic UART Service UUID, the conventional BLE serial pipe
pub const NUS_SERVICE_UUID: [u8; 16] = [
    0x6E, 0x40, 0x00, 0x01, 0xB5, 0xA3, 0xF3, 0x93, 0xE0, 0xA9, 0xE5, 0x0E, 0x24, 0xDC, 0xCA,
    0x9E,
];

/// Adapter variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdapterVariant {
    /// Externally tied GPIO pin pair
    GpioPair,
    /// UART with TX wired to RX (or an external echo plug)
    Uart,
    /// CAN controller, internal loopback or terminated bus
    Can,
    /// Onboard BLE module echoing over its serial pipe
    Ble,
}

/// GPIO pin-pair test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioPairConfig {
    /// Output driver mode for the driving pin
    pub drive: GpioDrive,
    /// Which pin drives; run the plan entry twice, once per direction,
    /// for a full bidirectional check
    pub direction: PairDirection,
    /// Settle time between driving a level and sampling it
    pub settle_us: u32,
}

impl Default for GpioPairConfig {
    fn default() -> Self {
        Self {
            drive: GpioDrive::PushPull,
            direction: PairDirection::AToB,
            settle_us: 1_000,
        }
    }
}

/// UART echo test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartEchoConfig {
    /// Baud rate in bit/s
    pub baud: u32,
}

impl Default for UartEchoConfig {
    fn default() -> Self {
        Self { baud: 115_200 }
    }
}

/// CAN loopback test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanLoopbackConfig {
    /// Bus bit-rate in bit/s
    pub bitrate: u32,
    /// Start in controller-internal loopback (true) or normal mode
    pub loopback: bool,
    /// Standard 11-bit identifier used for every frame
    pub message_id: u16,
    /// In normal mode, fall back to internal loopback automatically if
    /// the first frame is never received (single-node bench setups)
    pub auto_fallback: bool,
}

impl Default for CanLoopbackConfig {
    fn default() -> Self {
        Self {
            bitrate: 250_000,
            loopback: true,
            message_id: 0x408,
            auto_fallback: true,
        }
    }
}

/// BLE echo test configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BleEchoConfig {
    /// 128-bit service UUID the module advertises
    pub service_uuid: [u8; 16],
    /// Budget for the connection handshake during acquire
    pub connect_timeout_us: u64,
    /// Pulse the module's reset line before connecting
    pub reset_module: bool,
}

impl Default for BleEchoConfig {
    fn default() -> Self {
        Self {
            service_uuid: NUS_SERVICE_UUID,
            connect_timeout_us: 5_000_000,
            reset_module: true,
        }
    }
}

/// Configuration for one channel acquisition, tagged by variant
///
/// Passing a config to an adapter of a different variant is rejected
/// at acquisition time with `ChannelUnavailable`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelConfig {
    /// GPIO pin-pair toggling
    GpioPair(GpioPairConfig),
    /// UART echo
    Uart(UartEchoConfig),
    /// CAN self-loopback
    Can(CanLoopbackConfig),
    /// BLE echo-back
    Ble(BleEchoConfig),
}

impl ChannelConfig {
    /// The adapter variant this configuration targets
    pub fn variant(&self) -> AdapterVariant {
        match self {
            ChannelConfig::GpioPair(_) => AdapterVariant::GpioPair,
            ChannelConfig::Uart(_) => AdapterVariant::Uart,
            ChannelConfig::Can(_) => AdapterVariant::Can,
            ChannelConfig::Ble(_) => AdapterVariant::Ble,
        }
    }
}
