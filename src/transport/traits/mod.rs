//! Transport interface traits
//!
//! One trait per bus, kept to the operations the loopback adapters
//! actually need. Driver bindings map their HAL-specific errors to
//! [`crate::error::ChannelError`].

pub mod ble;
pub mod can;
pub mod clock;
pub mod gpio;
pub mod serial;

// Re-export trait interfaces
pub use ble::BleLink;
pub use can::{CanController, CanFrame, CAN_MAX_PAYLOAD};
pub use clock::Clock;
pub use gpio::{GpioDrive, PairDirection, PinPair};
pub use serial::SerialPort;
