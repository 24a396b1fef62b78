//! Simulated transports for host testing
//!
//! Each mock implements one transport trait with injectable behavior
//! (perfect echo, dropped data, bus faults, refusal to open) and counts
//! lifecycle calls so tests can assert the acquire/release discipline.

pub mod ble;
pub mod can;
pub mod clock;
pub mod gpio;
pub mod serial;

pub use ble::MockBle;
pub use can::MockCan;
pub use clock::MockClock;
pub use gpio::MockPinPair;
pub use serial::{MockSerial, SerialBehavior};
