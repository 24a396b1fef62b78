//! Transport seams
//!
//! This module defines the low-level interfaces the channel adapters
//! drive. Real driver bindings (register access, radio stacks) live
//! outside this crate and implement these traits; the simulated
//! implementations in [`mock`] stand in for them on the host.

pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use traits::{
    BleLink, CanController, CanFrame, Clock, GpioDrive, PairDirection, PinPair, SerialPort,
};
